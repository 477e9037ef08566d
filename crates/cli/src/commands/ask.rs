//! Ask command: answer one question from the terminal.

use clap::Args;
use wellness_core::config::AppConfig;
use wellness_research::{PipelineOutcome, RouteKind, WellnessPipeline};

/// Ask a single wellness question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Print the full pipeline outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        let pipeline = WellnessPipeline::from_config(config)?;
        let outcome = pipeline.run(&self.question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print!("{}", render(&outcome));
        }

        Ok(())
    }
}

/// Answer followed by a numbered source list.
fn render(outcome: &PipelineOutcome) -> String {
    let mut out = format!("{}\n", outcome.answer.trim_end());

    if outcome.route == RouteKind::Research {
        out.push_str("\nSources:\n");
        for (i, source) in outcome.sources().iter().enumerate() {
            out.push_str(&format!(
                "  [{}] {} ({}, {}). {}. {}\n",
                i + 1,
                source.title,
                source.authors,
                source.year,
                source.journal,
                source.url
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wellness_research::{DocumentRecord, Stage};

    fn outcome(route: RouteKind, documents: Vec<DocumentRecord>) -> PipelineOutcome {
        PipelineOutcome {
            question: "Does yoga help back pain?".to_string(),
            search_query: "yoga AND back pain".to_string(),
            route,
            answer: "Yoga can help [Source: 42].\n".to_string(),
            documents,
            stages: vec![Stage::Start, Stage::End],
        }
    }

    #[test]
    fn test_render_lists_sources() {
        let doc = DocumentRecord {
            id: "42".to_string(),
            title: "Yoga for chronic low back pain".to_string(),
            content: "Yoga reduced pain.".to_string(),
            authors: "Patel R, Kim S".to_string(),
            journal: "Spine".to_string(),
            year: "2019".to_string(),
            url: "https://pubmed.ncbi.nlm.nih.gov/42/".to_string(),
        };

        let text = render(&outcome(RouteKind::Research, vec![doc]));
        assert_eq!(
            text,
            "Yoga can help [Source: 42].\n\nSources:\n  [1] Yoga for chronic low back pain (Patel R, Kim S, 2019). Spine. https://pubmed.ncbi.nlm.nih.gov/42/\n"
        );
    }

    #[test]
    fn test_render_general_has_no_source_section() {
        let text = render(&outcome(RouteKind::General, Vec::new()));
        assert!(!text.contains("Sources:"));
    }
}

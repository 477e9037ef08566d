//! Pipeline tests driven by in-memory collaborators and a local E-utilities stub.

mod pipeline_flow;

pub mod extract;
pub mod ingest;
pub mod run;
pub mod sections;
pub mod slice;
pub mod status;

mod generate;
mod project_file;

pub use generate::{
    check_destinations, resolve_boilerplate, scaffold_workload, GenerationScope,
    ScaffoldOptions, ScaffoldRecord, ScaffoldReport, BOILERPLATE_PATH,
};
pub use project_file::{
    record_resources, ProjectApi, ProjectFile, ProjectResource, PROJECT_FILE,
};

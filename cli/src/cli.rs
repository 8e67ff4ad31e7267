use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "uitrack", version, about, long_about = None)]
pub struct UitrackCli {
    /// Project root holding the `scenarios/` directory.
    #[arg(long, env = "UITRACK_ROOT", default_value = ".uitrack")]
    pub root: PathBuf,

    /// Length of generated run ids.
    #[arg(long, env = "UITRACK_RUN_ID_LENGTH", default_value_t = 12)]
    pub run_id_length: usize,

    /// Print the response as a single line of JSON.
    #[arg(long)]
    pub compact: bool,

    /// The tool to invoke: init_project, create_scenario, start_run, complete_step,
    /// record_evidence, complete_run or get_run.
    pub tool: String,

    /// Tool parameters as a JSON object. Use `-` to read them from stdin.
    ///
    /// For example `uitrack start_run '{"scenarioSlug": "checkout"}'`.
    #[arg(default_value = "{}")]
    pub params: String,
}

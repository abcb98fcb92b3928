use clap::Parser;

/// This is a district opportunity scoring program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file containing per-district election history and
    /// competitiveness summaries for both chambers.
    #[clap(short, long, value_parser)]
    pub elections: String,

    /// (file path) The JSON file containing the current candidate filings and
    /// incumbents for both chambers.
    #[clap(short, long, value_parser)]
    pub candidates: String,

    /// (file path, 'stdout' or empty) If specified, the scored output will be written
    /// in JSON format to the given location instead of the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a previously scored output in JSON format.
    /// If provided, oppscore will check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (party name, default Democratic) The party from whose perspective the
    /// opportunity scores are computed.
    #[clap(long, value_parser)]
    pub party: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

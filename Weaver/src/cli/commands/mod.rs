use clap::Subcommand;
use std::path::PathBuf;

pub mod boards;
pub mod components;
pub mod import;
pub mod transpile;

#[derive(Subcommand)]
pub enum Commands {
    /// Import an Arcweave project into a dialogue database
    Import {
        /// Import preferences file (.json or .toml)
        #[arg(short, long)]
        prefs: PathBuf,

        /// Project folder or project_settings.json (overrides the preferences)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Output dialogue database (.json)
        #[arg(short, long)]
        output: PathBuf,

        /// Merge into an existing output database instead of replacing it
        #[arg(short, long)]
        merge: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List importable leaf boards with their start indices
    Boards {
        /// Project folder or project_settings.json
        #[arg(short, long)]
        project: PathBuf,
    },

    /// List component names with their actor indices
    Components {
        /// Project folder or project_settings.json
        #[arg(short, long)]
        project: PathBuf,
    },

    /// Translate one Arcscript fragment
    Transpile {
        /// Arcscript code
        code: String,

        /// Project whose variable names are recognized
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Translate as statements (desugars += and -=) instead of a condition
        #[arg(short, long)]
        statement: bool,

        /// Number of player profiles
        #[arg(long, default_value_t = 1)]
        players: u32,

        /// Comma-separated global variable allow-list
        #[arg(short, long)]
        globals: Option<String>,

        /// Extra variable names to recognize (comma-separated)
        #[arg(long)]
        variables: Option<String>,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Import {
                prefs,
                project,
                output,
                merge,
                quiet,
            } => import::execute(prefs, project.as_deref(), output, *merge, !*quiet),
            Commands::Boards { project } => boards::execute(project),
            Commands::Components { project } => components::execute(project),
            Commands::Transpile {
                code,
                project,
                statement,
                players,
                globals,
                variables,
            } => transpile::execute(
                code,
                project.as_deref(),
                *statement,
                *players,
                globals.as_deref(),
                variables.as_deref(),
            ),
        }
    }
}

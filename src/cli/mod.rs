use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the local HTTP API (JSON endpoints and the SSE chat stream)
    Serve,

    /// Report core, backend, pin, and database health
    Status {
        /// Print the raw JSON snapshot
        #[arg(long)]
        json: bool,
    },

    /// Show which pinned model a (role, tier) resolves to
    Resolve { role: String, tier: String },

    /// Create a conversation frozen to the resolved model
    New {
        role: String,
        tier: String,

        #[arg(short, long)]
        title: Option<String>,
    },

    List {
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        offset: Option<usize>,

        /// Case-insensitive title filter
        #[arg(short, long)]
        query: Option<String>,
    },

    Show { id: i64 },

    Rename { id: i64, title: String },

    /// Send a message and stream the reply
    Chat { id: i64, content: String },

    /// Write Markdown and JSON copies of a conversation
    Export { id: i64 },
}

use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for shifttracker
/// CLI application for location-verified shift attendance with SQLite
#[derive(Parser)]
#[command(
    name = "shifttracker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Location-verified shift attendance: geofenced check-in/out, breaks and certified payroll hours on SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/vim/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Create a work assignment with its geofenced site
    Assign {
        /// Worker identifier
        #[arg(long)]
        worker: String,

        /// Site display name
        #[arg(long)]
        site: String,

        /// Site latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Site longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Geofence radius in feet (default from config, 250 ft)
        #[arg(long = "radius-ft")]
        radius_ft: Option<f64>,

        /// Scheduled shift start (RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// Scheduled shift end (RFC 3339)
        #[arg(long)]
        end: Option<String>,
    },

    /// List assignments
    Assignments,

    /// Dry-run geofence check for a position (no ledger write)
    Locate {
        /// Assignment id
        assignment: i64,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Reported GPS accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,
    },

    /// Verified clock-in at the assignment site
    Checkin {
        /// Assignment id
        assignment: i64,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Reported GPS accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,

        /// Event timestamp (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,

        /// Client idempotency key (default: generated)
        #[arg(long)]
        key: Option<String>,
    },

    /// Clock-out; the session moves to pending certification
    Checkout {
        /// Assignment id
        assignment: i64,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Reported GPS accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,

        /// Event timestamp (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,

        /// Client idempotency key (default: generated)
        #[arg(long)]
        key: Option<String>,

        /// Expected session version (optimistic concurrency guard)
        #[arg(long = "expect-version")]
        expect_version: Option<i64>,
    },

    /// Start or end a break on an active session
    Break {
        /// Session id
        session: i64,

        /// Start a break of the given type (meal | rest)
        #[arg(long, value_name = "TYPE", conflicts_with = "end")]
        start: Option<String>,

        /// End the open break
        #[arg(long)]
        end: bool,

        /// Event timestamp (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,

        /// Client idempotency key (default: generated)
        #[arg(long)]
        key: Option<String>,

        /// Expected session version (optimistic concurrency guard)
        #[arg(long = "expect-version")]
        expect_version: Option<i64>,
    },

    /// Certify a pending session and close it
    Certify {
        /// Session id
        session: i64,

        /// Attested payable hours
        #[arg(long)]
        hours: f64,

        /// Attested number of breaks (default: actual closed count)
        #[arg(long = "breaks")]
        break_count: Option<i64>,

        /// Signer name
        #[arg(long)]
        signer: String,

        /// Explicit attestation that the record is accurate
        #[arg(long)]
        attested: bool,

        /// Expected session version (optimistic concurrency guard)
        #[arg(long = "expect-version")]
        expect_version: Option<i64>,
    },

    /// Show the event audit trail of an assignment (rejections included)
    History {
        /// Assignment id
        assignment: i64,
    },

    /// List sessions with computed payable time
    Sessions {
        #[arg(long)]
        assignment: Option<i64>,

        #[arg(long)]
        worker: Option<String>,

        /// Filter by state (active, on_break, pending_certification, closed, cancelled)
        #[arg(long)]
        state: Option<String>,
    },

    /// Reconcile a queued batch of offline events (JSON file)
    Sync {
        /// Batch file path
        #[arg(long, value_name = "FILE")]
        file: String,
    },

    /// Export payroll data
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        /// Include open and pending sessions
        #[arg(long)]
        all: bool,

        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Create a backup copy of the database
    Backup {
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long)]
        compress: bool,
    },
}

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;
use zoneforge_editor::{Category, FailurePolicy};

/// ZoneForge client - edit zone records, users, groups and roles from a terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "zoneforge", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "ZONEFORGE_CONFIG", default_value = "zoneforge.toml", global = true)]
    pub config: PathBuf,

    /// Backend base URL, e.g. http://127.0.0.1:5000
    #[arg(long, env = "ZONEFORGE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token from a previous login
    #[arg(long, env = "ZONEFORGE_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Login name, used when no token is configured
    #[arg(long, env = "ZONEFORGE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "ZONEFORGE_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// What a failed save does to the row
    #[arg(long, value_enum, global = true)]
    pub failure_policy: Option<PolicyArg>,

    /// Answer every confirmation with yes
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the rows of a table
    List {
        #[arg(value_parser = parse_category)]
        category: Category,

        /// Zone of the records table
        #[arg(long)]
        zone: Option<String>,
    },

    /// Edit an existing row and save it
    Edit {
        #[command(flatten)]
        target: RowTarget,

        /// New field value, `field=value`; `data.<label>=value` for record data
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<Assignment>,

        /// Pre-edit value the listing does not provide, e.g. `role=admin,dns_read`
        #[arg(long = "original", value_parser = parse_assignment)]
        original: Vec<Assignment>,
    },

    /// Create a row
    Create {
        #[arg(value_parser = parse_category)]
        category: Category,

        /// Zone of the records table
        #[arg(long)]
        zone: Option<String>,

        /// Field value, `field=value`; `data.<label>=value` for record data
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<Assignment>,
    },

    /// Delete a row after confirmation
    Delete {
        #[command(flatten)]
        target: RowTarget,
    },

    /// Show the data fields of a DNS record type
    Types { record_type: String },
}

/// Addresses one existing row
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RowTarget {
    /// users, groups, roles or records
    #[arg(value_parser = parse_category)]
    pub category: Category,

    /// Name or id of the row; the record name for records
    pub key: String,

    /// Zone of the record
    #[arg(long)]
    pub zone: Option<String>,

    /// Record type, required for records
    #[arg(long = "type")]
    pub record_type: Option<String>,

    /// Position of the record among records of the same name and type
    #[arg(long, default_value_t = 0)]
    pub index: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    StayEditing,
    Rollback,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::StayEditing => FailurePolicy::StayEditing,
            PolicyArg::Rollback => FailurePolicy::Rollback,
        }
    }
}

/// `field=value` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub field: String,
    pub value: String,
}

impl Assignment {
    /// `data.address=...` addresses the `address` sub-field of `data`
    pub fn sub_field(&self) -> Option<(&str, &str)> {
        self.field.split_once('.')
    }
}

fn parse_assignment(arg: &str) -> Result<Assignment, String> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{}`", arg))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{}`", arg));
    }
    Ok(Assignment {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_category(arg: &str) -> Result<Category, String> {
    Category::from_str(arg)
        .map_err(|_| format!("unknown table `{}`, expected users, groups, roles or records", arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["zoneforge", "list", "users"]);
        assert_eq!(cli.config, PathBuf::from("zoneforge.toml"));
        assert!(cli.base_url.is_none());
        assert!(cli.failure_policy.is_none());
        assert!(!cli.yes);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(
            cli.command,
            Command::List {
                category: Category::Users,
                zone: None
            }
        ));
    }

    #[test]
    fn test_edit_with_assignments() {
        let cli = Cli::parse_from([
            "zoneforge",
            "edit",
            "groups",
            "ops",
            "--set",
            "name=operations",
            "--set",
            "role=admin,dns_read",
            "--original",
            "role=admin",
            "--yes",
            "-vv",
            "--failure-policy",
            "rollback",
        ]);

        assert!(cli.yes);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.failure_policy, Some(PolicyArg::Rollback));
        match cli.command {
            Command::Edit { target, set, original } => {
                assert_eq!(target.category, Category::Groups);
                assert_eq!(target.key, "ops");
                assert_eq!(target.index, 0);
                assert_eq!(set.len(), 2);
                assert_eq!(set[1].value, "admin,dns_read");
                assert_eq!(original[0].field, "role");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_record_target() {
        let cli = Cli::parse_from([
            "zoneforge",
            "delete",
            "records",
            "www",
            "--zone",
            "example.com",
            "--type",
            "A",
            "--index",
            "2",
        ]);
        match cli.command {
            Command::Delete { target } => {
                assert_eq!(target.zone.as_deref(), Some("example.com"));
                assert_eq!(target.record_type.as_deref(), Some("A"));
                assert_eq!(target.index, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_assignment_parsing() {
        let assignment = parse_assignment("data.address=192.0.2.1").unwrap();
        assert_eq!(assignment.sub_field(), Some(("data", "address")));
        assert_eq!(assignment.value, "192.0.2.1");

        let keeps_equals = parse_assignment("data.txt=v=spf1 -all").unwrap();
        assert_eq!(keeps_equals.value, "v=spf1 -all");

        assert!(parse_assignment("name").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!(Cli::try_parse_from(["zoneforge", "list", "zones"]).is_err());
    }
}

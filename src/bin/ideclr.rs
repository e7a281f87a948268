//! DDM 声明生成器：根据命令行参数输出一个声明 JSON 文档

use clap::{CommandFactory, Parser, Subcommand};
use ddmsync_lib::declare::{Declaration, DeclarationKind};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ideclr", version, about = "DDM declaration generator")]
struct Cli {
    /// Declaration identifier (auto-generated UUID if not specified)
    #[arg(short, long)]
    identifier: Option<String>,

    /// Declaration ServerToken
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// com.apple.management.properties DDM declaration
    Properties,
    /// com.apple.activation.simple DDM declaration
    Activation {
        /// Activation predicate
        #[arg(short, long)]
        predicate: Option<String>,
        /// Declaration to activate
        #[arg(required = true)]
        declaration: Vec<String>,
    },
    /// com.apple.configuration.management.status-subscriptions DDM declaration
    Subscription {
        /// Status item to subscribe to
        #[arg(required = true)]
        item: Vec<String>,
    },
    /// com.apple.configuration.legacy DDM declaration
    Profile {
        /// URL of profile
        url: String,
    },
    /// com.apple.configuration.legacy.interactive DDM declaration
    Iprofile {
        /// URL of profile
        url: String,
        /// Visible name of configuration
        visiblename: String,
    },
    /// com.apple.management.organization-info DDM declaration
    OrgInfo {
        /// Name of organization
        name: String,
        /// Email address
        #[arg(short, long)]
        email: Option<String>,
        /// URL of the organization
        #[arg(short, long)]
        url: Option<String>,
        /// Organization verification identity token
        #[arg(short = 't', long)]
        identitytoken: Option<String>,
    },
    /// com.apple.configuration.management.test DDM declaration
    Test {
        /// Echo string
        echo: String,
        /// Status to return
        #[arg(short, long)]
        returnstatus: Option<String>,
    },
    /// com.apple.configuration.watch.enrollment DDM declaration
    WatchEnrollment {
        /// URL of the enrollment profile
        url: String,
    },
}

impl From<Command> for DeclarationKind {
    fn from(command: Command) -> Self {
        match command {
            Command::Properties => DeclarationKind::Properties,
            Command::Activation {
                predicate,
                declaration,
            } => DeclarationKind::Activation {
                declarations: declaration,
                predicate,
            },
            Command::Subscription { item } => DeclarationKind::Subscription { items: item },
            Command::Profile { url } => DeclarationKind::Profile { url },
            Command::Iprofile { url, visiblename } => DeclarationKind::InteractiveProfile {
                url,
                visible_name: visiblename,
            },
            Command::OrgInfo {
                name,
                email,
                url,
                identitytoken,
            } => DeclarationKind::OrgInfo {
                name,
                email,
                url,
                identity_token: identitytoken,
            },
            Command::Test { echo, returnstatus } => DeclarationKind::Test {
                echo,
                return_status: returnstatus,
            },
            Command::WatchEnrollment { url } => DeclarationKind::WatchEnrollment { url },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::from(2);
    };

    let declaration = Declaration::build(&command.into(), cli.identifier, cli.token);
    match declaration.to_pretty_json() {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR encoding declaration: {}", e);
            ExitCode::FAILURE
        }
    }
}

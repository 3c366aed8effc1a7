//! ntunnel: HTTP tunnel for MySQL
//!
//! # Usage
//!
//! ```bash
//! # Serve the tunnel (default subcommand)
//! ntunnel --bind 0.0.0.0:8000
//!
//! # Run a connection test without HTTP
//! ntunnel probe --host localhost --login root
//!
//! # Run statements and print the decoded answer
//! ntunnel probe --login root --db test -q "SELECT 1" -q "SELECT NOW()"
//! ```

use std::path::PathBuf;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use ntunnel::engine::MySqlConnector;
use ntunnel::protocol::decoder::{
    ConnectionResponse, QueryResponse, StatementBody, StatementGroup,
};
use ntunnel::protocol::{decode_connection_response, decode_query_response, FieldType};
use ntunnel::{ActionRouter, TunnelConfig, TunnelReply, TunnelRequest, TunnelServer};

#[derive(Parser)]
#[command(name = "ntunnel")]
#[command(version)]
#[command(about = "HTTP tunnel for MySQL", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "EXAMPLES:
    ntunnel --bind 127.0.0.1:8000 --no-test-menu
    ntunnel probe --host db.internal --login app -q 'SELECT 1'
    ntunnel probe --login root -q 'SHOW TABLES' --format json")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tunnel over HTTP
    Serve(ServeArgs),
    /// Run one tunnel request locally and print the decoded answer
    Probe(ProbeArgs),
}

#[derive(Args, Clone)]
struct ServeArgs {
    /// HTTP bind address
    #[arg(long, env = "NTUNNEL_BIND")]
    bind: Option<String>,

    /// Config file (defaults to <config dir>/ntunnel/config.toml)
    #[arg(short, long, env = "NTUNNEL_CONFIG")]
    config: Option<PathBuf>,

    /// Answer requests with missing parameters with an error frame instead of the diagnostic page
    #[arg(long)]
    no_test_menu: bool,
}

#[derive(Args)]
struct ProbeArgs {
    /// Database host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Database port
    #[arg(long, default_value_t = 3306)]
    port: u16,

    /// Database user
    #[arg(short, long)]
    login: String,

    /// Database password
    #[arg(short, long, env = "NTUNNEL_PASSWORD", default_value = "")]
    password: String,

    /// Default schema
    #[arg(long, default_value = "")]
    db: String,

    /// SQL statement (repeatable). Without any, a connection test runs
    #[arg(short = 'q', long = "query")]
    queries: Vec<String>,

    /// Send statements base64-encoded
    #[arg(long)]
    base64: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Config file (for read keywords)
    #[arg(short, long, env = "NTUNNEL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve(cli.serve)) {
        Commands::Serve(args) => serve(args).await,
        Commands::Probe(args) => probe(args).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TunnelConfig> {
    let config = match path {
        Some(path) => TunnelConfig::load(path)?,
        None => TunnelConfig::discover()?,
    };
    Ok(config)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ntunnel=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let mut builder = TunnelServer::builder().config(load_config(args.config.as_ref())?);
    if let Some(bind) = args.bind {
        builder = builder.bind(bind);
    }
    if args.no_test_menu {
        builder = builder.test_menu(false);
    }

    let server = builder.build();
    if let Err(e) = server.serve().await {
        tracing::error!("server stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn probe(args: ProbeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let router = ActionRouter::new(config, MySqlConnector);

    let action = if args.queries.is_empty() { "C" } else { "Q" };
    let mut request = TunnelRequest::new()
        .field("actn", action)
        .field("host", args.host.as_str())
        .field("port", args.port.to_string())
        .field("login", args.login.as_str())
        .field("password", args.password.as_str())
        .field("db", args.db.as_str());
    if args.base64 {
        request = request.field("encodeBase64", "1");
    }
    for sql in &args.queries {
        let value = if args.base64 { BASE64.encode(sql) } else { sql.clone() };
        request = request.field("q", value);
    }

    let body = match router.dispatch(&request).await {
        TunnelReply::Frames(body) => body,
        TunnelReply::Page(_) => anyhow::bail!("tunnel answered with the diagnostic page"),
    };

    if args.queries.is_empty() {
        let response = decode_connection_response(&body).context("malformed connection response")?;
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
            OutputFormat::Table => print_connection(&response),
        }
    } else {
        let response = decode_query_response(&body).context("malformed query response")?;
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
            OutputFormat::Table => print_query(&args.queries, &response),
        }
    }
    Ok(())
}

fn print_connection(response: &ConnectionResponse) {
    match response {
        ConnectionResponse::Connected { info, .. } => {
            println!("{} Connection Success!", "✓".green());
            println!("  {} {}", "Host:".dimmed(), info.host_info);
            println!("  {} {}", "Protocol:".dimmed(), info.proto_info);
            println!("  {} {}", "Server:".dimmed(), info.server_version.cyan());
        }
        ConnectionResponse::Error { header, message } => {
            println!("{} {} - {}", "✗".red(), header.errno.to_string().red().bold(), message);
        }
    }
}

fn print_query(queries: &[String], response: &QueryResponse) {
    let statements = match response {
        QueryResponse::Statements { statements, .. } => statements,
        QueryResponse::Error { header, message } => {
            println!("{} {} - {}", "✗".red(), header.errno.to_string().red().bold(), message);
            return;
        }
    };

    let executed = queries.iter().map(|q| q.trim()).filter(|q| !q.is_empty());
    for (sql, group) in executed.zip(statements) {
        println!("{} {}", ">".dimmed(), sql.yellow());
        print_group(group);
        println!();
    }
}

fn print_group(group: &StatementGroup) {
    match &group.body {
        StatementBody::Message { text } if group.header.errno != 0 => {
            println!("{} {} - {}", "✗".red(), group.header.errno.to_string().red().bold(), text);
        }
        StatementBody::Message { text } => {
            println!("{} {}", "✓".green(), text);
        }
        StatementBody::Rows { fields, rows } => {
            if rows.is_empty() {
                println!("{}", "(no results)".dimmed());
            }

            // Calculate column widths
            let mut widths: Vec<usize> = fields.iter().map(|f| f.name.chars().count()).collect();
            for row in rows {
                for (w, cell) in widths.iter_mut().zip(row) {
                    *w = (*w).max(cell_text(cell).chars().count());
                }
            }

            let header: Vec<String> = fields
                .iter()
                .zip(&widths)
                .map(|(f, w)| format!("{:width$}", f.name, width = *w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let types: Vec<String> = fields
                .iter()
                .zip(&widths)
                .map(|(f, w)| {
                    let name = FieldType::from_code(f.type_code).map(FieldType::name).unwrap_or("?");
                    format!("{:width$}", name, width = *w)
                })
                .collect();
            println!("{}", types.join(" │ ").dimmed());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in rows {
                let cells: Vec<String> = row
                    .iter()
                    .zip(&widths)
                    .map(|(cell, w)| format!("{:width$}", cell_text(cell), width = *w))
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!("{} row(s) returned", group.header.num_rows.to_string().cyan());
        }
    }
}

fn cell_text(cell: &Option<String>) -> &str {
    cell.as_deref().unwrap_or("NULL")
}

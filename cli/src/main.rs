use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use leapcell_core::{
    ClientOptions, Filter, HttpTransport, Leapcell, NameType, Order, OrderSpec, Record,
    SearchOptions, Table, API_TOKEN_ENV, API_URL_ENV, DEFAULT_BASE_URL,
};
use log::debug;
use prettytable::{Cell, Row, Table as PrettyTable};
use serde_json::Value;
use std::{fs, path::PathBuf};

#[derive(Parser)]
#[command(author, version, about = "CLI tool for Leapcell tables")]
struct Cli {
    /// API token
    #[arg(long, env = API_TOKEN_ENV, hide_env_values = true)]
    api_key: String,

    /// Service base url
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Repository, as `{user}/{repo}`
    #[arg(short, long)]
    repository: String,

    /// Table id
    #[arg(short, long)]
    table: String,

    /// Address fields by name or by id
    #[arg(long, default_value = "name")]
    name_type: NameType,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the table schema
    Meta,

    /// Query records
    Query {
        /// Equality condition `field=value`, repeatable
        #[arg(short, long = "where")]
        conditions: Vec<String>,

        /// Sort key `field[:asc|desc]`, repeatable
        #[arg(short, long = "order")]
        orders: Vec<String>,

        /// Comma-separated list of fields to return
        #[arg(long)]
        fields: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Print the request body instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Count records
    Count {
        #[arg(short, long = "where")]
        conditions: Vec<String>,

        /// Count distinct records only
        #[arg(long)]
        distinct: bool,
    },

    /// Full-text search
    Search {
        keyword: String,

        /// Comma-separated list of fields to search in
        #[arg(long)]
        search_fields: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u64,
    },

    /// Fetch one record by id
    Get { id: String },

    /// Delete one record by id
    DeleteById { id: String },

    /// Upload files; several files go in one request
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn split_list(list: Option<String>) -> Vec<String> {
    list.map(|s| {
        s.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// `field=value`, where the value is read as JSON when it parses and as a
/// plain string otherwise.
fn parse_condition(condition: &str) -> Result<(String, Value)> {
    let (field, raw) = condition
        .split_once('=')
        .ok_or_else(|| anyhow!("condition '{condition}' should look like field=value"))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
    Ok((field.trim().to_string(), value))
}

fn parse_conditions(conditions: &[String]) -> Result<Option<Filter>> {
    let pairs = conditions
        .iter()
        .map(|c| parse_condition(c))
        .collect::<Result<Vec<_>>>()?;
    Ok(Filter::from_conditions(pairs))
}

fn parse_order(order: &str) -> Result<Order> {
    let (field, direction) = order.split_once(':').unwrap_or((order, "desc"));
    Ok(Order::parse(field, direction)?)
}

fn print_records(records: &[Record<HttpTransport>], format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let values: Vec<Value> = records.iter().map(Record::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        Format::Table => {
            let mut columns: Vec<&String> = records.iter().flat_map(|r| r.data().keys()).collect();
            columns.sort();
            columns.dedup();

            let mut table = PrettyTable::new();
            let mut header = vec![Cell::new("record_id")];
            header.extend(columns.iter().map(|c| Cell::new(c)));
            table.add_row(Row::new(header));
            for record in records {
                let mut row = vec![Cell::new(record.record_id().unwrap_or(""))];
                row.extend(columns.iter().map(|c| {
                    Cell::new(&record.get(c).map(Value::to_string).unwrap_or_default())
                }));
                table.add_row(Row::new(row));
            }
            table.printstd();
        }
    }
    Ok(())
}

fn show_meta(table: &Table<HttpTransport>, format: Format) -> Result<()> {
    let meta = table.meta()?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&meta.to_json())?),
        Format::Table => {
            let mut out = PrettyTable::new();
            out.add_row(Row::new(vec![
                Cell::new("id"),
                Cell::new("name"),
                Cell::new("type"),
            ]));
            for field in meta.field_id_metas().values() {
                out.add_row(Row::new(vec![
                    Cell::new(&field.id),
                    Cell::new(&field.name),
                    Cell::new(field.field_type.as_str()),
                ]));
            }
            out.printstd();
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let options = ClientOptions::default().with_base_url(cli.base_url);
    let client = Leapcell::with_options(&cli.api_key, options)?;
    let table = client.table(&cli.repository, &cli.table, cli.name_type)?;
    debug!("using {table}");

    match cli.command {
        Commands::Meta => show_meta(&table, cli.format),
        Commands::Query {
            conditions,
            orders,
            fields,
            limit,
            offset,
            dry_run,
        } => {
            let orders = orders
                .iter()
                .map(|o| parse_order(o))
                .collect::<Result<OrderSpec>>()?;
            let mut query = table.select(split_list(fields));
            query
                .filter_by(parse_conditions(&conditions)?)
                .order_by(orders)
                .limit(limit)
                .offset(offset);
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&query.compile_query()?)?);
                return Ok(());
            }
            print_records(&query.query()?, cli.format)
        }
        Commands::Count {
            conditions,
            distinct,
        } => {
            let mut query = table.select(Vec::<String>::new());
            query.filter_by(parse_conditions(&conditions)?);
            match query.count(distinct)? {
                Some(count) => println!("{count}"),
                None => bail!("service did not report a count"),
            }
            Ok(())
        }
        Commands::Search {
            keyword,
            search_fields,
            limit,
            offset,
        } => {
            let options = SearchOptions {
                search_fields: split_list(search_fields),
                limit,
                offset,
                ..SearchOptions::default()
            };
            print_records(&table.search(&keyword, options)?, cli.format)
        }
        Commands::Get { id } => match table.get_by_id(&id)? {
            Some(record) => print_records(&[record], cli.format),
            None => bail!("record '{id}' not found"),
        },
        Commands::DeleteById { id } => {
            table.delete_by_id(&id)?;
            eprintln!("Deleted record {id}");
            Ok(())
        }
        Commands::Upload { files } => {
            let payloads = files
                .iter()
                .map(|path| fs::read(path).with_context(|| format!("reading {}", path.display())))
                .collect::<Result<Vec<_>>>()?;
            let uploaded = if payloads.len() == 1 {
                let name = files[0].file_name().and_then(|n| n.to_str());
                let payload = payloads.into_iter().next().unwrap_or_default();
                vec![table.upload_file(payload, name)?]
            } else {
                table.upload_files(payloads)?
            };
            for file in uploaded {
                println!("{file}");
            }
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse())
}

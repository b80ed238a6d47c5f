use serde::Serialize;
use torqlink_config::{ConfigBlock, ConfigSet, FieldValue};
use torqlink_session::BlockDump;

use crate::cmd::{connect, ConfigArgs, ConfigCommand, DumpArgs, LinkArgs, SetArgs};
use crate::exit::{config_error, session_error, CliError, CliResult, SUCCESS};
use crate::output::{hex_upper, print_json, print_pretty, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct FieldOutput {
    name: &'static str,
    value: FieldValue,
}

#[derive(Serialize)]
struct BlockOutput {
    block: &'static str,
    number: u8,
    read_only: bool,
    fields: Vec<FieldOutput>,
}

#[derive(Serialize)]
struct DumpOutput {
    number: u8,
    request: String,
    response: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct SetOutput<'a> {
    block: &'static str,
    field: &'a str,
    value: FieldValue,
    written: usize,
}

pub fn run(args: ConfigArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    match args.command {
        ConfigCommand::Read => read(link, format),
        ConfigCommand::Dump(args) => dump(args, link, format),
        ConfigCommand::Set(args) => set(args, link, format),
    }
}

fn read(link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut connector = connect(link)?;
    let mut config = ConfigSet::new();
    connector
        .read_config(&mut config)
        .map_err(|err| session_error("config read failed", err))?;

    match format {
        OutputFormat::Json => {
            let blocks: Vec<BlockOutput> = config.iter().map(block_output).collect();
            print_json(&blocks);
        }
        OutputFormat::Table => print_table(
            ["BLOCK", "FIELD", "VALUE"],
            config.iter().flat_map(|block| {
                block.fields().map(move |(spec, value)| {
                    vec![block.name().to_string(), spec.name.to_string(), value.to_string()]
                })
            }),
        ),
        OutputFormat::Pretty => {
            for block in &config {
                println!("{block}");
            }
        }
        OutputFormat::Raw => {
            for block in &config {
                let image = block
                    .gen_payload()
                    .map_err(|err| config_error("config encode failed", err))?;
                print_raw(&image);
            }
        }
    }
    Ok(SUCCESS)
}

fn dump(args: DumpArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    if args.first > args.last {
        return Err(CliError::usage(format!(
            "--first ({}) must not exceed --last ({})",
            args.first, args.last
        )));
    }

    let mut connector = connect(link)?;
    let dumps = connector
        .dump_config_blocks(args.first..=args.last)
        .map_err(|err| session_error("config dump failed", err))?;

    match format {
        OutputFormat::Json => {
            let out: Vec<DumpOutput> = dumps.iter().map(dump_output).collect();
            print_json(&out);
        }
        OutputFormat::Table => print_table(
            ["BLOCK", "REQUEST", "RESPONSE", "ERROR"],
            dumps.iter().map(|dump| {
                let out = dump_output(dump);
                vec![
                    out.number.to_string(),
                    out.request,
                    out.response.unwrap_or_else(|| "-".to_string()),
                    out.error.unwrap_or_default(),
                ]
            }),
        ),
        OutputFormat::Pretty => {
            for dump in &dumps {
                let out = dump_output(dump);
                print_pretty(&[
                    ("block", out.number.to_string()),
                    ("request", out.request),
                    ("response", out.response.unwrap_or_else(|| "-".to_string())),
                    ("error", out.error.unwrap_or_else(|| "-".to_string())),
                ]);
            }
        }
        OutputFormat::Raw => {
            for response in dumps.iter().filter_map(|dump| dump.response.as_ref()) {
                print_raw(response);
            }
        }
    }
    Ok(SUCCESS)
}

fn set(args: SetArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    // Reject bad names and values before touching the port.
    let mut config = ConfigSet::new();
    check_edit(&mut config, &args)?;

    let mut connector = connect(link)?;
    connector
        .read_config(&mut config)
        .map_err(|err| session_error("config read failed", err))?;
    let (block, value) = check_edit(&mut config, &args)?;
    let written = connector
        .write_config(&config)
        .map_err(|err| session_error("config write failed", err))?;

    match format {
        OutputFormat::Json => print_json(&SetOutput {
            block,
            field: &args.field,
            value,
            written,
        }),
        OutputFormat::Table => print_table(
            ["BLOCK", "FIELD", "VALUE", "BLOCKS WRITTEN"],
            [vec![
                block.to_string(),
                args.field.clone(),
                value.to_string(),
                written.to_string(),
            ]],
        ),
        OutputFormat::Pretty | OutputFormat::Raw => print_pretty(&[
            ("block", block.to_string()),
            ("field", args.field.clone()),
            ("value", value.to_string()),
            ("written", written.to_string()),
        ]),
    }
    Ok(SUCCESS)
}

fn check_edit(config: &mut ConfigSet, args: &SetArgs) -> CliResult<(&'static str, FieldValue)> {
    let block = config
        .by_name_mut(&args.block)
        .map_err(|err| config_error("config set", err))?;
    let value = block
        .set_str(&args.field, &args.value)
        .map_err(|err| config_error("config set", err))?;
    Ok((block.name(), value))
}

fn block_output(block: &ConfigBlock) -> BlockOutput {
    BlockOutput {
        block: block.name(),
        number: block.number(),
        read_only: block.is_read_only(),
        fields: block
            .fields()
            .map(|(spec, value)| FieldOutput {
                name: spec.name,
                value,
            })
            .collect(),
    }
}

fn dump_output(dump: &BlockDump) -> DumpOutput {
    DumpOutput {
        number: dump.number,
        request: hex_upper(&dump.request),
        response: dump.response.as_deref().map(hex_upper),
        error: dump.error.clone(),
    }
}

//! Command-line Modbus/TCP client

use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use mbtcp::*;

mod args;
mod output;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),
}

#[derive(Parser)]
#[command(name = "mbtget")]
#[command(about = "A command line program for making Modbus/TCP client requests using the mbtcp crate")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "localhost", value_parser = args::parse_host, help = "host name or IPv4 address of the server")]
    host: String,

    #[arg(short = 'p', long, default_value = "502", value_parser = args::parse_port, help = "TCP port of the server")]
    port: u16,

    #[arg(short = 'u', long, default_value = "1", value_parser = args::parse_unit_id, help = "unit id of the Modbus server")]
    unit_id: u8,

    #[arg(short = 't', long, default_value = "5", value_parser = args::parse_timeout, help = "timeout in seconds (1-119)")]
    timeout: Duration,

    #[arg(short = 'd', long, action = ArgAction::Count, help = "log every frame sent and received, repeat (-dd) to also log socket reads and writes")]
    dump: u8,

    #[arg(short = 's', long, help = "print raw values separated by ';'")]
    script: bool,

    #[arg(long, help = "print values in hexadecimal")]
    hex: bool,

    #[arg(short = 'f', long, help = "read pairs of registers as floats")]
    float: bool,

    #[arg(short = '2', long, help = "print registers as two's complement integers")]
    twos_complement: bool,

    #[arg(long, value_enum, default_value_t = Order::HighFirst, help = "register holding the high word of a float")]
    word_order: Order,

    #[arg(long, help = "optional polling period in milliseconds")]
    period: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(name = "rc", about = "read coils")]
    ReadCoils(ReadArgs),

    #[command(name = "rdi", about = "read discrete inputs")]
    ReadDiscreteInputs(ReadArgs),

    #[command(name = "rhr", about = "read holding registers")]
    ReadHoldingRegisters(ReadArgs),

    #[command(name = "rir", about = "read input registers")]
    ReadInputRegisters(ReadArgs),

    #[command(name = "wsc", about = "write single coil")]
    WriteSingleCoil(WriteSingleCoilArgs),

    #[command(name = "wsr", about = "write single register")]
    WriteSingleRegister(WriteSingleRegisterArgs),
}

#[derive(Args)]
struct ReadArgs {
    #[arg(short = 'a', long, default_value = "0", value_parser = args::parse_address, help = "the starting address")]
    address: u16,

    #[arg(short = 'n', long, default_value = "1", value_parser = args::parse_count, help = "number of values (1-125)")]
    number: u16,
}

#[derive(Args)]
struct WriteSingleCoilArgs {
    #[arg(short = 'a', long, value_parser = args::parse_address, help = "the address of the coil")]
    address: u16,

    #[arg(short = 'v', long, value_parser = args::parse_bit, help = "the value of the coil (0 or 1)")]
    value: bool,
}

#[derive(Args)]
struct WriteSingleRegisterArgs {
    #[arg(short = 'a', long, value_parser = args::parse_address, help = "the address of the register")]
    address: u16,

    #[arg(short = 'v', long, value_parser = args::parse_word, help = "the value of the register")]
    value: u16,
}

#[derive(Copy, Clone, ValueEnum)]
enum Order {
    HighFirst,
    LowFirst,
}

impl From<Order> for WordOrder {
    fn from(value: Order) -> Self {
        match value {
            Order::HighFirst => WordOrder::HighFirst,
            Order::LowFirst => WordOrder::LowFirst,
        }
    }
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let decode = match self.dump {
            0 => DecodeLevel::nothing(),
            1 => DecodeLevel::nothing()
                .application(PduDecodeLevel::DataValues)
                .frame(AduDecodeLevel::Payload),
            _ => DecodeLevel::new(
                PduDecodeLevel::DataValues,
                AduDecodeLevel::Payload,
                PhysDecodeLevel::Data,
            ),
        };
        ClientConfig::new(self.host.clone())
            .port(self.port)
            .unit_id(UnitId::new(self.unit_id))
            .timeout(self.timeout)
            .decode(decode)
    }

    fn interpretation(&self) -> Interpretation {
        if self.float {
            Interpretation::Float(self.word_order.into())
        } else if self.hex {
            Interpretation::Hex
        } else if self.twos_complement {
            Interpretation::Signed
        } else {
            Interpretation::Unsigned
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.dump > 0 {
        tracing::Level::INFO
    } else {
        tracing::Level::ERROR
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.period {
        None => match run_once(&cli).await {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Some(period_ms) => {
            let period = Duration::from_millis(period_ms);
            loop {
                match run_once(&cli).await {
                    Ok(text) => println!("{text}"),
                    Err(e) => println!("Error: {e}"),
                }
                tokio::time::sleep(period).await
            }
        }
    }
}

/// Connect, run the command and close, returning the text to print
async fn run_once(cli: &Cli) -> Result<String, Error> {
    let mut session = ClientSession::connect(&cli.config()).await?;
    let result = run_command(cli, &mut session).await;
    session.close().await;
    result
}

async fn run_command(cli: &Cli, session: &mut ClientSession) -> Result<String, Error> {
    let text = match &cli.command {
        Command::ReadCoils(args) => {
            read_bits(cli, session, FunctionCode::ReadCoils, args).await?
        }
        Command::ReadDiscreteInputs(args) => {
            read_bits(cli, session, FunctionCode::ReadDiscreteInputs, args).await?
        }
        Command::ReadHoldingRegisters(args) => {
            read_registers(cli, session, FunctionCode::ReadHoldingRegisters, args).await?
        }
        Command::ReadInputRegisters(args) => {
            read_registers(cli, session, FunctionCode::ReadInputRegisters, args).await?
        }
        Command::WriteSingleCoil(args) => {
            let ok = session.write_bit(args.address, args.value).await? == args.value;
            output::write_result("bit", ok)
        }
        Command::WriteSingleRegister(args) => {
            let ok = session.write_register(args.address, args.value).await?;
            output::write_result("word", ok)
        }
    };
    Ok(text)
}

async fn read_bits(
    cli: &Cli,
    session: &mut ClientSession,
    function: FunctionCode,
    args: &ReadArgs,
) -> Result<String, Error> {
    let bits = session
        .read_bits(function, args.address, args.number)
        .await?;
    if cli.script {
        Ok(output::script(&output::bits_as_words(&bits)))
    } else {
        Ok(output::listing(
            args.address,
            &output::bits_as_values(&bits, cli.hex),
        ))
    }
}

async fn read_registers(
    cli: &Cli,
    session: &mut ClientSession,
    function: FunctionCode,
    args: &ReadArgs,
) -> Result<String, Error> {
    // each float takes two registers
    let count = if cli.float {
        args.number * 2
    } else {
        args.number
    };

    if cli.script {
        let words = if function == FunctionCode::ReadHoldingRegisters {
            session.read_holding_registers(args.address, count).await?
        } else {
            session.read_input_registers(args.address, count).await?
        };
        return Ok(output::script(&words));
    }

    let values = session
        .read_registers_as(function, args.address, count, cli.interpretation())
        .await?;
    Ok(output::listing(args.address, &values))
}

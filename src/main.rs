// xpectrum: flight ticket lookup and boarding-pass export

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use tracing::error;

use xpectrum_boarding::codec::{self, ScanSource};
use xpectrum_boarding::config::PdfConfig;
use xpectrum_boarding::logging::{init_logging, Verbosity};
use xpectrum_boarding::pdf::{export_message, generate_boarding_pass};
use xpectrum_boarding::{
    ApiClient, Config, Error, FlightSummary, LookupState, Result, TicketDetail, TicketLookup,
};

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Look up flight tickets and export boarding passes")]
struct Args {
    /// Configuration file (defaults to ~/.config/xpectrum/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// More log output (repeat for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available flights
    Flights,

    /// List passengers of a flight
    Passengers {
        /// Flight code
        flight_code: String,
    },

    /// Look up a ticket from an already scanned QR payload
    Lookup {
        /// Text read from the QR code
        payload: String,

        /// Also export the boarding pass as PDF
        #[arg(long)]
        pdf: bool,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Read the QR code in an image and look up its ticket
    Scan {
        /// Image containing the QR code
        image: PathBuf,

        /// Also export the boarding pass as PDF
        #[arg(long)]
        pdf: bool,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export a boarding pass from a ticket route
    Pdf {
        /// Route as printed by `lookup` or `scan`
        route: String,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Write the Code 128 barcode for a booking reference as PNG
    Barcode {
        text: String,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a QR code for a flight code as PNG
    Qr {
        text: String,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    /// Directory for the PDF (defaults to the downloads folder)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Logo image (file path or URL)
    #[arg(long)]
    logo: Option<String>,
}

impl ExportArgs {
    fn apply(&self, base: &PdfConfig) -> PdfConfig {
        let mut config = base.clone();
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(logo) = &self.logo {
            config.logo = Some(logo.clone());
        }
        config
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(Verbosity::from_flags(args.quiet, args.verbose));

    let mut config = Config::load_from(args.config.clone())?;
    if let Some(base_url) = &args.base_url {
        config.api.base_url = base_url.clone();
    }
    config.validate()?;

    let client = ApiClient::new(config.api.clone());

    match args.command {
        Command::Flights => list_flights(client).await,
        Command::Passengers { flight_code } => list_passengers(client, flight_code).await,
        Command::Lookup { payload, pdf, export } => {
            let pdf_config = pdf.then(|| export.apply(&config.pdf));
            lookup_ticket(client, ScanSource::Payload(payload), pdf_config).await
        }
        Command::Scan { image, pdf, export } => {
            let pdf_config = pdf.then(|| export.apply(&config.pdf));
            lookup_ticket(client, ScanSource::ImageFile(image), pdf_config).await
        }
        Command::Pdf { route, export } => {
            let ticket = TicketDetail::from_route(&route)
                .ok_or_else(|| Error::Parse(format!("not a ticket route: {}", route)))?;
            Ok(export_pdf(ticket, export.apply(&config.pdf)).await)
        }
        Command::Barcode { text, output } => {
            let img = codec::generate_barcode_image(&text)?;
            std::fs::write(&output, codec::to_png(&img)?)?;
            println!("✓ Generated: {}", output.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Qr { text, output } => {
            let img = codec::generate_qr_image(&text)?;
            std::fs::write(&output, codec::to_png(&img)?)?;
            println!("✓ Generated: {}", output.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Run a blocking call off the async runtime.
async fn in_background<T, F>(f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(value) => Some(value),
        Err(e) => {
            error!("background task failed: {}", e);
            None
        }
    }
}

async fn list_flights(client: ApiClient) -> Result<ExitCode> {
    let flights = in_background(move || client.fetch_flights())
        .await
        .unwrap_or_default();

    if flights.is_empty() {
        eprintln!("No se encontraron vuelos");
        return Ok(ExitCode::FAILURE);
    }

    println!("Vuelos Disponibles");
    for flight in &flights {
        print_flight(flight);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_flight(flight: &FlightSummary) {
    println!();
    println!("Vuelo - {}", flight.flight_code);
    println!(
        "  Salida:  {} a las {}",
        flight.departure_date_formatted(),
        flight.departure_time
    );
    println!(
        "  Llegada: {} a las {}",
        flight.arrival_date_formatted(),
        flight.arrival_time
    );
    println!("  {} ({})", flight.origin_airport, flight.origin_country);
    println!("  [{}]", flight.status_label());
}

async fn list_passengers(client: ApiClient, flight_code: String) -> Result<ExitCode> {
    let code = flight_code.clone();
    let passengers = in_background(move || client.fetch_passengers(&code))
        .await
        .unwrap_or_default();

    if passengers.is_empty() {
        eprintln!("No se encontraron pasajeros para el vuelo {}", flight_code);
        return Ok(ExitCode::FAILURE);
    }

    println!("Pasajeros Vuelo {}", flight_code);
    for p in &passengers {
        println!(
            "  {} {}  documento: {}  asiento: {}",
            p.name,
            p.surname,
            p.document.as_deref().unwrap_or("-"),
            p.seat.as_deref().unwrap_or("-")
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn lookup_ticket(
    client: ApiClient,
    source: ScanSource,
    pdf_config: Option<PdfConfig>,
) -> Result<ExitCode> {
    let mut lookup = TicketLookup::new(Arc::new(client));
    let state = lookup.submit(source).await.clone();

    match state {
        LookupState::Success(ticket) => {
            for line in ticket.detail_lines() {
                println!("{}", line);
            }
            println!("Ruta: {}", ticket.to_route());
            match pdf_config {
                Some(config) => Ok(export_pdf(ticket, config).await),
                None => Ok(ExitCode::SUCCESS),
            }
        }
        LookupState::Idle => {
            eprintln!("Nada que buscar: el código QR está vacío");
            Ok(ExitCode::FAILURE)
        }
        other => {
            eprintln!("{}", other.message().unwrap_or_default());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn export_pdf(ticket: TicketDetail, config: PdfConfig) -> ExitCode {
    let result = in_background(move || generate_boarding_pass(&ticket, &config))
        .await
        .unwrap_or_else(|| Err(Error::Pdf("export task failed".to_string())));

    let message = export_message(&result);
    match result {
        Ok(path) => {
            println!("{}", message);
            println!("  File: {}", path.display());
            ExitCode::SUCCESS
        }
        Err(_) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

use clap::Parser;
use invoicedb::{
    commands,
    config::{CliArgs, Config},
    form::InvoiceForm,
    logging,
    service::InvoiceService,
    storage,
};

fn main() -> ExitCode {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    logging::init(&config.logging);

    let storage = match storage::open(&config.database) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!(error = %e, path = %config.database.path, "Failed to open storage");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let form = match InvoiceForm::standard() {
        Ok(form) => form,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let service = InvoiceService::new(storage);

    let today = time::OffsetDateTime::now_utc().date();
    match commands::execute(&service, &form, &config, &cli.command, today) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

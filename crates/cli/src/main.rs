use clap::Parser;
use geoapi_doctor::Doctor;
use std::process::ExitCode;

fn main() -> ExitCode {
    geoapi_doctor::init_tracing_subscriber();
    let report = Doctor::parse().run();
    report.print();
    if report.ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

use std::thread;
use std::time::Duration;

use serde_json::json;

use form_flow::config::DemoConfig;
use form_flow::flows;
use form_flow::remote::StubDirectory;
use form_flow::wizard::WizardFlow;
use form_flow::AppResult;

/// Initialize tracing for the demo binary.
///
/// Console output goes to stderr so the walkthrough itself stays
/// readable on stdout. With `log_to_file`, logs are mirrored to a
/// daily-rotated file under the platform config directory.
fn initialize_tracing(log_to_file: bool) {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    if log_to_file {
        let log_dir = dirs::config_dir()
            .map(|dir| dir.join("form-flow").join("logs"))
            .unwrap_or_else(|| std::path::PathBuf::from("logs"));
        if let Err(error) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Warning: Failed to create log directory: {}", error);
        }
        let file_appender = rolling::daily(&log_dir, "form-flow.log");
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_target(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .init();
        tracing::info!("Log directory: {}", log_dir.display());
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .init();
    }
}

/// Block until any deferred validation for the active step settles.
fn wait_for_validation(flow: &mut WizardFlow) {
    while flow.is_validating() {
        thread::sleep(Duration::from_millis(25));
        flow.pump();
    }
}

/// Print the live-filtered progress dots plus the active step.
fn print_progress(flow: &WizardFlow) {
    let dots: Vec<String> = flow
        .navigable_indices()
        .into_iter()
        .map(|index| {
            if index == flow.current_index() {
                "[*]".to_string()
            } else if flow.state().is_step_completed(index) {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            }
        })
        .collect();
    let (position, total) = flow.display_position();
    println!(
        "  {} step {}/{}: {}",
        dots.join(" "),
        position,
        total,
        flow.current_step().title()
    );
    if let Some(error) = flow.current_error() {
        println!("      error: {}", error);
    }
}

fn run_company_setup() -> AppResult<()> {
    println!("== company-setup ==");
    let demo = flows::company_setup()?;
    let store = demo.build_store();
    let mut flow = WizardFlow::new(demo.steps, store.snapshot())?;
    flow.attach(store.bus());
    flow.on_complete(|snapshot| println!("  completed with: {}", snapshot.root()));

    print_progress(&flow);

    store.set("basic_info.company_name", json!("Acme Rockets"))?;
    store.set("basic_info.industry", json!("aerospace"))?;
    flow.pump();
    anyhow::ensure!(flow.advance(), "basic step did not validate");
    print_progress(&flow);

    store.set("contact_info.headquarters.country", json!("NO"))?;
    store.set("contact_info.headquarters.city", json!("Oslo"))?;
    store.set("contact_info.contact.email", json!("ops@acme.test"))?;
    store.set("contact_info.contact.phone", json!("+47 555 01 234"))?;
    flow.pump();
    anyhow::ensure!(flow.advance(), "contact step did not validate");
    print_progress(&flow);

    store.push("departments", json!({ "name": "Engineering", "head_count": 12 }))?;
    store.push("departments", json!({ "name": "Sales", "head_count": 4 }))?;
    store.move_item("departments", 1, 0)?;
    flow.pump();
    anyhow::ensure!(flow.advance(), "departments step did not validate");
    print_progress(&flow);

    store.push("settings.working_hours.working_days", json!("monday"))?;
    store.push("settings.working_hours.working_days", json!("tuesday"))?;
    flow.pump();
    anyhow::ensure!(flow.advance(), "settings step did not validate");
    Ok(())
}

fn run_conditional_order(directory: &StubDirectory) -> AppResult<()> {
    println!("== conditional-order ==");
    let demo = flows::conditional_order(directory)?;
    let store = demo.build_store();
    let mut flow = WizardFlow::new(demo.steps, store.snapshot())?;
    flow.attach(store.bus());
    flow.on_complete(|snapshot| println!("  completed with: {}", snapshot.root()));

    // Individual customers skip the business step entirely.
    print_progress(&flow);

    store.set("customer_type", json!("business"))?;
    store.set("customer_info.name", json!("Acme GmbH"))?;
    store.set("customer_info.email", json!("orders@acme.test"))?;
    flow.pump();
    print_progress(&flow);
    anyhow::ensure!(flow.advance(), "customer step did not validate");

    store.set("business_info.company_name", json!("Acme GmbH"))?;
    store.set("business_info.business_number", json!("DE-123456"))?;
    flow.pump();
    anyhow::ensure!(flow.advance(), "business step did not validate");
    print_progress(&flow);

    println!("  checking account with the stub directory...");
    wait_for_validation(&mut flow);
    print_progress(&flow);
    anyhow::ensure!(flow.advance(), "account step did not validate");

    store.set("agreements.terms_of_service", json!(true))?;
    flow.pump();
    anyhow::ensure!(flow.advance(), "agreements step did not validate");
    Ok(())
}

fn main() -> AppResult<()> {
    let config = DemoConfig::load().unwrap_or_else(|error| {
        eprintln!("Warning: {}", error);
        DemoConfig::default()
    });
    initialize_tracing(config.log_to_file);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "form-flow demo starting"
    );

    let directory = StubDirectory::new(
        Duration::from_millis(config.stub_latency_ms),
        Duration::from_millis(config.stub_jitter_ms),
    );

    run_company_setup()?;
    run_conditional_order(&directory)?;
    Ok(())
}

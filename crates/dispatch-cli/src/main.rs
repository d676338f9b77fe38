//! Main entry point for the dispatch CLI.
//!
//! This binary is the terminal rendition of the order-dispatch workflow:
//! log in, list the orders visible to the actor, and — depending on role —
//! assign the offered driver to an order or advance its shipping status.
//! Every control it renders comes from the status engine's available
//! actions; the CLI itself decides nothing about the lifecycle.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dispatch_config::Config;
use dispatch_core::DispatchClient;
use dispatch_order::{available_actions, derive_state};
use dispatch_storage::{create_backend, StorageService};
use dispatch_types::utils::time::format_local;
use dispatch_types::{format_amount, truncate_id, Order, Role};

/// Command-line arguments for the dispatch client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
	/// Log in and cache the issued credential
	Login {
		/// Email address or phone number
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
	},
	/// Show the identity behind the cached credential
	Whoami,
	/// List orders with their derived state and available actions
	Orders,
	/// Show a single order in full
	Show { order_id: String },
	/// Assign the offered driver to a pending order
	Dispatch {
		order_id: String,
		/// Free-text note recorded on the dispatch event
		#[arg(long, default_value = "")]
		note: String,
	},
	/// Move a dispatched order into shipping, or update the shipping note
	Ship {
		order_id: String,
		#[arg(long, default_value = "")]
		note: String,
	},
	/// Mark an in-transit order as delivered
	Deliver {
		order_id: String,
		#[arg(long, default_value = "")]
		note: String,
	},
	/// Drop the cached credential
	Logout,
}

#[tokio::main]
async fn main() {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).with_target(true).init();

	// Backend failures surface as a message, never a panic.
	if let Err(e) = run(args).await {
		eprintln!("error: {}", e);
		std::process::exit(1);
	}
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Invalid config path: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::debug!(api = %config.api.base_url, storage = %config.storage.primary, "Loaded configuration");

	let backend = create_backend(&config.storage.primary, &config.primary_storage_config())?;
	let api = dispatch_api::create_api(&config.api)?;
	let client = DispatchClient::new(api, StorageService::new(backend));

	let offset = config.display.utc_offset_hours;

	match args.command {
		Command::Login { email, password } => {
			let identity = client.login(&email, &password).await?;
			match identity.first_name {
				Some(name) => println!("Welcome back, {}", name),
				None => println!("Welcome back"),
			}
			println!("Role: {}", identity.role);
		}
		Command::Whoami => {
			let identity = client.identity().await?;
			println!("Id:    {}", identity.id);
			println!("Role:  {}", identity.role);
			if let Some(name) = identity.first_name {
				println!("Name:  {}", name);
			}
		}
		Command::Orders => {
			let identity = client.identity().await?;
			let orders = client.refresh_orders().await?;
			if orders.is_empty() {
				println!("No orders available.");
			} else {
				for order in &orders {
					println!("{}", render_order_row(order, identity.role, offset));
				}
			}
		}
		Command::Show { order_id } => {
			let identity = client.identity().await?;
			client.refresh_orders().await?;
			let order = client.order(&order_id).await?;
			print_order(&order, identity.role, offset);
		}
		Command::Dispatch { order_id, note } => {
			client.refresh_orders().await?;
			let updated = client.dispatch(&order_id, &note).await?;
			println!("Dispatched {} ({})", updated.id, derive_state(&updated));
		}
		Command::Ship { order_id, note } => {
			client.refresh_orders().await?;
			let updated = client.mark_shipping(&order_id, &note).await?;
			println!("Updated {} ({})", updated.id, derive_state(&updated));
		}
		Command::Deliver { order_id, note } => {
			client.refresh_orders().await?;
			let updated = client.mark_delivered(&order_id, &note).await?;
			println!("Updated {} ({})", updated.id, derive_state(&updated));
		}
		Command::Logout => {
			client.logout().await?;
			println!("Logged out.");
		}
	}

	Ok(())
}

/// Renders one order as a list row: id, reference, total, creation time,
/// derived state, and the actions open to this actor.
fn render_order_row(order: &Order, role: Role, utc_offset_hours: i8) -> String {
	let state = derive_state(order);
	let actions: Vec<String> = available_actions(order, role)
		.iter()
		.map(ToString::to_string)
		.collect();

	format!(
		"{:<12} {:<14} {:>16} {} {:<10} [{}]",
		truncate_id(&order.id),
		order.order_id,
		format_amount(order.amount_total, &order.currency),
		format_local(&order.date_created, utc_offset_hours),
		state.to_string(),
		actions.join(", ")
	)
}

/// Prints a full order: customer, products, shipping history, and the
/// actions currently open to this actor.
fn print_order(order: &Order, role: Role, utc_offset_hours: i8) {
	println!("Order ID: {}", order.id);
	println!("Reference: {}", order.order_id);
	println!(
		"Total: {}",
		format_amount(order.amount_total, &order.currency)
	);
	println!(
		"Date Created: {}",
		format_local(&order.date_created, utc_offset_hours)
	);
	println!(
		"Customer: {} {} ({})",
		order.customer_details.first_name,
		order.customer_details.last_name,
		order.customer_details.city
	);

	println!("Product Details:");
	for product in &order.product_details {
		println!(
			"  {} x{} ({}, {}, {})",
			product.product_name, product.quantity, product.color, product.memory, product.storage
		);
	}

	println!("Shipping Details:");
	for event in &order.shipping_details {
		println!("  - {}", event.note);
		println!("    {}", format_local(&event.date_created, utc_offset_hours));
		if let Some(driver) = &event.dispatched_to_id {
			println!("    dispatched to {}", driver);
		}
	}

	println!("Status: {}", order.status);
	println!("State: {}", derive_state(order));

	let actions: Vec<String> = available_actions(order, role)
		.iter()
		.map(ToString::to_string)
		.collect();
	if actions.is_empty() {
		println!("Actions: none");
	} else {
		println!("Actions: {}", actions.join(", "));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use dispatch_types::{CustomerDetails, OrderStatus, ShippingEvent};

	fn sample_order() -> Order {
		Order {
			id: "ord_6f2a9c11".to_string(),
			order_id: "SO-2024-0917".to_string(),
			amount_total: 28_990_000,
			date_created: Utc.with_ymd_and_hms(2024, 5, 1, 9, 15, 42).unwrap(),
			currency: "vnd".to_string(),
			customer_details: CustomerDetails {
				first_name: "Linh".to_string(),
				last_name: "Tran".to_string(),
				address: "12 Hang Bac".to_string(),
				zip_code: 10_000,
				city: "Hanoi".to_string(),
				state: "HN".to_string(),
				email: "linh.tran@example.com".to_string(),
				phone_number: "+84 912 345 678".to_string(),
			},
			product_details: Vec::new(),
			shipping_details: vec![ShippingEvent {
				dispatcher_id: None,
				dispatched_to_id: None,
				pickup_address: Some("48 Warehouse Rd".to_string()),
				note: "Order placed".to_string(),
				date_created: Utc.with_ymd_and_hms(2024, 5, 1, 9, 15, 42).unwrap(),
			}],
			status: OrderStatus::Created,
			payment_status: 1,
		}
	}

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["dispatch", "orders"]).unwrap();

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "warn");
		assert_eq!(args.command, Command::Orders);
	}

	#[test]
	fn test_args_subcommand_with_note() {
		let args = Args::try_parse_from([
			"dispatch",
			"ship",
			"ord_6f2a",
			"--note",
			"Picked up",
		])
		.unwrap();

		assert_eq!(
			args.command,
			Command::Ship {
				order_id: "ord_6f2a".to_string(),
				note: "Picked up".to_string(),
			}
		);
	}

	#[test]
	fn test_render_row_for_dispatcher() {
		let row = render_order_row(&sample_order(), Role::Dispatcher, 7);

		assert!(row.contains("ord_6f2a.."));
		assert!(row.contains("SO-2024-0917"));
		assert!(row.contains("28990000 VND"));
		assert!(row.contains("2024-05-01 16:15:42"));
		assert!(row.contains("Pending"));
		assert!(row.contains("[dispatch]"));
	}

	#[test]
	fn test_render_row_hides_unavailable_actions() {
		let row = render_order_row(&sample_order(), Role::Shipper, 7);
		assert!(row.ends_with("[]"));
	}
}

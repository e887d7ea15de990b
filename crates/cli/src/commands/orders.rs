use cutquote_core::domain::customer::CustomerId;
use cutquote_db::repositories::SqlOrderRepository;
use cutquote_db::OrderRepository;

use crate::commands::{open_pool, prepare, CommandResult};

/// Lists persisted orders as JSON under `data`, newest id last.
pub fn run(customer: Option<&str>) -> CommandResult {
    let (config, runtime) = match prepare("orders") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let repository = SqlOrderRepository::new(pool.clone());
        let orders = match customer {
            Some(id) => repository.list_for_customer(&CustomerId(id.to_string())).await,
            None => repository.list_all().await,
        }
        .map_err(|error| ("order_query", error.to_string(), 6u8));
        pool.close().await;
        orders
    });

    let orders = match result {
        Ok(orders) => orders,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("orders", error_class, message, exit_code)
        }
    };

    match serde_json::to_value(&orders) {
        Ok(data) => {
            let scope = customer.map(|id| format!(" for customer {id}")).unwrap_or_default();
            CommandResult::success_with_data(
                "orders",
                format!("{} orders{scope}", orders.len()),
                Some(data),
            )
        }
        Err(error) => CommandResult::failure("orders", "serialization", error.to_string(), 7),
    }
}

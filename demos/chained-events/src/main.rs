//! Chained Events Example
//!
//! Handlers are registered in a container through modules and receive their
//! dependencies by constructor. Placing an order publishes follow-up events
//! from inside a handler, which run before the next order handler:
//!
//! ```text
//! OrderPlaced
//! ├── ReserveStock ──publish──▶ StockReserved
//! │                             └── NotifyWarehouse
//! ├── ChargeCustomer
//! └── AuditTrail (every event)
//! ```
//!
//! # Usage
//!
//! ```bash
//! MEMBUS_LOGGING__LEVEL=debug cargo run --package chained-events
//! ```

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use membus::prelude::*;
use membus::runtime::bootstrap;
use tracing::info;

// ============================================================================
// Events
// ============================================================================

#[derive(Debug)]
struct OrderPlaced {
    order_id: u64,
    sku: &'static str,
    quantity: u32,
}

#[derive(Debug)]
struct StockReserved {
    order_id: u64,
    sku: &'static str,
}

// ============================================================================
// Services
// ============================================================================

trait Inventory: Send + Sync {
    fn reserve(&self, sku: &str, quantity: u32) -> Result<()>;
}

struct InMemoryInventory;

impl Inventory for InMemoryInventory {
    fn reserve(&self, sku: &str, quantity: u32) -> Result<()> {
        info!(sku, quantity, "Stock reserved");
        Ok(())
    }
}

trait Payments: Send + Sync {
    fn charge(&self, order_id: u64) -> Result<()>;
}

struct FakePayments;

impl Payments for FakePayments {
    fn charge(&self, order_id: u64) -> Result<()> {
        info!(order_id, "Customer charged");
        Ok(())
    }
}

/// Set once the bus is constructed; handlers that publish resolve it.
type BusSlot = OnceLock<WeakBus>;

fn bus_from(container: &membus::container::Container) -> Result<WeakBus, ContainerError> {
    container
        .resolve::<BusSlot>()?
        .get()
        .cloned()
        .ok_or_else(|| ContainerError::custom("bus is not constructed yet"))
}

// ============================================================================
// Handlers
// ============================================================================

struct ReserveStock {
    inventory: Arc<dyn Inventory>,
    bus: WeakBus,
}

impl Handle<OrderPlaced> for ReserveStock {
    fn handle(&self, event: &OrderPlaced) -> HandlerResult {
        self.inventory.reserve(event.sku, event.quantity)?;
        self.bus.publish(StockReserved {
            order_id: event.order_id,
            sku: event.sku,
        })?;
        Ok(())
    }
}

struct ChargeCustomer {
    payments: Arc<dyn Payments>,
}

impl Handle<OrderPlaced> for ChargeCustomer {
    fn handle(&self, event: &OrderPlaced) -> HandlerResult {
        self.payments.charge(event.order_id)
    }
}

struct NotifyWarehouse;

impl Handle<StockReserved> for NotifyWarehouse {
    fn handle(&self, event: &StockReserved) -> HandlerResult {
        info!(order_id = event.order_id, sku = event.sku, "Warehouse notified");
        Ok(())
    }
}

struct AuditTrail;

impl HandleAny for AuditTrail {
    fn handle_any(&self, event: EventRef<'_>) -> HandlerResult {
        info!(event = %event.event_type(), "Audit");
        Ok(())
    }
}

// ============================================================================
// Modules
// ============================================================================

struct ServicesModule;

impl Module for ServicesModule {
    fn load(&self, builder: &mut ContainerBuilder) {
        builder
            .register_instance::<dyn Inventory>(Arc::new(InMemoryInventory))
            .register_singleton::<dyn Payments, _>(|_| {
                Ok(Arc::new(FakePayments) as Arc<dyn Payments>)
            });
    }
}

struct OrdersModule;

impl Module for OrdersModule {
    fn load(&self, builder: &mut ContainerBuilder) {
        builder
            .register_handler(
                HandlerRegistration::new(|c| {
                    Ok(ReserveStock {
                        inventory: c.resolve::<dyn Inventory>()?,
                        bus: bus_from(c)?,
                    })
                })
                .handles::<OrderPlaced>(),
            )
            .register_handler(
                HandlerRegistration::new(|c| {
                    Ok(ChargeCustomer {
                        payments: c.resolve::<dyn Payments>()?,
                    })
                })
                .handles::<OrderPlaced>(),
            )
            .register_handler(
                HandlerRegistration::new(|_| Ok(NotifyWarehouse)).handles::<StockReserved>(),
            )
            .register_handler(
                HandlerRegistration::new(|_| Ok(AuditTrail))
                    .handles_any()
                    .single_instance(),
            );
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let (_config, setup) = bootstrap::load_setup()?;

    let slot = Arc::new(BusSlot::new());
    let mut builder = ContainerBuilder::new();
    builder
        .register_instance(Arc::clone(&slot))
        .register_module(&ServicesModule)
        .register_module(&OrdersModule);
    let container = builder.build();

    let bus = setup
        .apply::<IocSupport>(|s| {
            s.set_resolver(container.resolver())
                .set_handler_shape(Handles);
        })
        .construct()?;
    slot.set(bus.downgrade())
        .map_err(|_| anyhow::anyhow!("bus slot was already filled"))?;

    for (order_id, sku) in [(1, "widget"), (2, "gadget")] {
        let order = OrderPlaced {
            order_id,
            sku,
            quantity: 3,
        };
        info!(?order, "Placing order");
        bus.publish(order)?;
    }

    Ok(())
}

use log::*;
use meli_tools::{MeliOrder, OrderBuyer};
use odoo_tools::OdooRpc;
use serde::Serialize;

use crate::{
    db_types::{OdooRefs, Order, OrderId},
    fulfillment::{FulfillmentSync, PickingOutcome},
    helpers::ProcessingLocks,
    ingest::normalize::new_order_from_meli,
    traits::{MarketplaceClient, OrderStore, SyncError},
};

/// What a single order notification amounted to.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The order was fetched, stored and (best effort) propagated to Odoo.
    Ingested(Box<Order>),
    /// The order was already in the store. The notification was a no-op.
    AlreadyProcessed(Box<Order>),
    /// Another ingestion of this order is in flight.
    Locked(OrderId),
}

/// What a single shipment notification amounted to.
#[derive(Debug)]
pub enum ShipmentOutcome {
    /// The shipment payload did not name an owning order.
    Unresolvable(i64),
    /// The owning order is not in the local store.
    UnknownOrder(OrderId),
    /// The shipment is not delivered yet. Nothing to reconcile.
    NotDelivered(OrderId),
    /// The order has no sales document in Odoo yet. A later notification (or the
    /// polling fallback) will reconcile once propagation has happened.
    NotPropagated(OrderId),
    /// Pickings were validated and the order is completed.
    Completed { order: Box<Order>, outcomes: Vec<PickingOutcome> },
}

/// Summary of one polling pass over the marketplace's recent orders.
#[derive(Debug, Default, Serialize)]
pub struct PollReport {
    pub fetched: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub failures: Vec<(OrderId, String)>,
}

/// The ingestion orchestrator. Generic over the store, the marketplace client and the
/// ERP transport so every flow can run against mocks.
#[derive(Clone)]
pub struct IngestApi<S, M, R> {
    store: S,
    marketplace: M,
    fulfillment: FulfillmentSync<R>,
    locks: ProcessingLocks,
}

impl<S, M, R> IngestApi<S, M, R>
where
    S: OrderStore,
    M: MarketplaceClient,
    R: OdooRpc,
{
    pub fn new(store: S, marketplace: M, fulfillment: FulfillmentSync<R>, locks: ProcessingLocks) -> Self {
        Self { store, marketplace, fulfillment, locks }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn marketplace(&self) -> &M {
        &self.marketplace
    }

    pub fn fulfillment(&self) -> &FulfillmentSync<R> {
        &self.fulfillment
    }

    /// Handles an `orders_v2` notification.
    ///
    /// The store is the durable dedup check; the in-memory lock absorbs notification
    /// bursts while an ingestion is in flight. On success the lock is deliberately
    /// left to expire on its own, since the stored row already guards against
    /// re-ingestion. On a permanent marketplace rejection (the resource is gone or
    /// forbidden) the lock is released immediately so a later, possibly corrected,
    /// notification is not blocked for the full window.
    pub async fn process_order_notification(&self, order_id: i64) -> Result<IngestOutcome, SyncError> {
        let oid = OrderId::from(order_id);
        if let Some(existing) = self.store.fetch_order(&oid).await? {
            debug!("🔔️ Order {oid} is already ingested. Ignoring the notification.");
            return Ok(IngestOutcome::AlreadyProcessed(Box::new(existing)));
        }
        if !self.locks.try_acquire(oid.as_str()) {
            info!("🔔️ Order {oid} is already being processed. Skipping the duplicate notification.");
            return Ok(IngestOutcome::Locked(oid));
        }
        match self.ingest_order(order_id).await {
            Ok(order) => Ok(IngestOutcome::Ingested(Box::new(order))),
            Err(e) => {
                if matches!(&e, SyncError::Marketplace(me) if me.is_permanent()) {
                    debug!("🔔️ Order {oid} failed permanently. Releasing its processing lock.");
                    self.locks.release(oid.as_str());
                }
                Err(e)
            },
        }
    }

    async fn ingest_order(&self, order_id: i64) -> Result<Order, SyncError> {
        let meli_order = self.marketplace.fetch_order(order_id).await?;
        let buyer = self.enrich_buyer(&meli_order).await;
        let new_order = new_order_from_meli(&meli_order, &buyer);
        let (order, inserted) = self.store.insert_order(new_order).await?;
        if !inserted {
            debug!("🔔️ Order {} was stored by a concurrent ingestion", order.order_id);
            return Ok(order);
        }
        info!("📝️ Stored {order}");
        let order = match self.fulfillment.propagate_order(&order).await {
            Ok(result) => {
                let refs = OdooRefs {
                    order_id: result.odoo_order_id,
                    reference: result.reference,
                    client_ref: result.client_ref,
                    pickings: result.pickings,
                };
                self.store.set_odoo_refs(&order.order_id, refs).await?
            },
            Err(e) => {
                error!(
                    "💼️ Could not propagate order {} to Odoo. {e}. The order stays stored without ERP \
                     references.",
                    order.order_id
                );
                order
            },
        };
        // The shipment may already read as delivered by the time the order arrives.
        if order.is_delivered() {
            if let (Some(odoo_id), Some(shipping)) = (order.odoo_order_id, order.shipping.clone()) {
                info!("🚚️ Order {} arrived already delivered. Reconciling now.", order.order_id);
                self.fulfillment.confirm_delivery(odoo_id).await?;
                return self.store.mark_completed(&order.order_id, &shipping.status, &shipping.tags).await;
            }
        }
        Ok(order)
    }

    /// Merges the buyer detail from the users endpoint over the order's embedded
    /// snapshot. A failed fetch degrades to the snapshot alone.
    async fn enrich_buyer(&self, order: &MeliOrder) -> OrderBuyer {
        let mut buyer = order.buyer.clone();
        match self.marketplace.fetch_buyer(buyer.id).await {
            Ok(detail) => {
                buyer.nickname = detail.nickname.clone().or(buyer.nickname);
                buyer.email = detail.email.clone().or(buyer.email);
                buyer.first_name = detail.first_name.clone().or(buyer.first_name);
                buyer.last_name = detail.last_name.clone().or(buyer.last_name);
                buyer.phone = detail.phone_number().or(buyer.phone);
                buyer.identification_type = detail.identification_kind().or(buyer.identification_type);
                buyer.identification_number = detail.identification_number().or(buyer.identification_number);
            },
            Err(e) => {
                warn!("🔔️ Could not fetch buyer {} detail. Using the order's snapshot. {e}", buyer.id);
            },
        }
        buyer
    }

    /// Handles a `shipments` notification. The shipment is fetched first, since the
    /// notification only carries the shipment id and shipment ids are not order ids.
    pub async fn process_shipment_notification(&self, shipment_id: i64) -> Result<ShipmentOutcome, SyncError> {
        let shipment = self.marketplace.fetch_shipment(shipment_id).await?;
        let Some(order_id) = shipment.order_id else {
            warn!("🚚️ Shipment {shipment_id} does not name an owning order. Ignoring.");
            return Ok(ShipmentOutcome::Unresolvable(shipment_id));
        };
        let oid = OrderId::from(order_id);
        let Some(order) = self.store.fetch_order(&oid).await? else {
            info!("🚚️ Shipment {shipment_id} belongs to order {oid}, which is not ingested yet.");
            return Ok(ShipmentOutcome::UnknownOrder(oid));
        };
        if !shipment.is_delivered() {
            debug!("🚚️ Shipment {shipment_id} ({}) is not delivered yet", shipment.status);
            return Ok(ShipmentOutcome::NotDelivered(oid));
        }
        let Some(odoo_id) = order.odoo_order_id else {
            info!("🚚️ Order {oid} is delivered but has no sales document yet. Deferring reconciliation.");
            return Ok(ShipmentOutcome::NotPropagated(oid));
        };
        let outcomes = self.fulfillment.confirm_delivery(odoo_id).await?;
        let order = self.store.mark_completed(&oid, &shipment.status, &shipment.tags).await?;
        let validated = outcomes.iter().filter(|o| o.validated).count();
        info!("✅️ Order {oid} completed. {validated}/{} picking(s) validated.", outcomes.len());
        Ok(ShipmentOutcome::Completed { order: Box::new(order), outcomes })
    }

    /// The polling fallback: walks the seller's recent orders and ingests any the
    /// webhooks missed. Individual failures are recorded and do not stop the pass.
    pub async fn poll_orders(&self) -> Result<PollReport, SyncError> {
        let summaries = self.marketplace.fetch_orders().await?;
        let mut report = PollReport { fetched: summaries.len(), ..Default::default() };
        for summary in summaries {
            let oid = OrderId::from(summary.id);
            match self.process_order_notification(summary.id).await {
                Ok(IngestOutcome::Ingested(_)) => report.ingested += 1,
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    error!("🔁️ Polling could not ingest order {oid}. {e}");
                    report.failures.push((oid, e.to_string()));
                },
            }
        }
        info!(
            "🔁️ Polling pass done. {} fetched, {} ingested, {} skipped, {} failed.",
            report.fetched,
            report.ingested,
            report.skipped,
            report.failures.len()
        );
        Ok(report)
    }

    /// Drops expired processing locks. Run periodically.
    pub fn sweep_expired_locks(&self) -> usize {
        self.locks.sweep()
    }
}

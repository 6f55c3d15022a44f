//! In-memory store of host listings.
//!
//! Screens that show spots subscribe to the store instead of reading a shared
//! global list. Every mutation notifies each observer with the full, current
//! slice of listings.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BookingMode, BookingPriceBreakdown, BookingRequest, Engine, EngineError,
    booking::host_rate_from_f64,
};

/// A parking spot offered by a host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    /// Hourly rate asked by the host; the booking mode band still applies.
    pub host_rate: Option<Decimal>,
    /// Booking modes the host accepts.
    pub modes: Vec<BookingMode>,
}

impl Listing {
    pub fn new(title: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            address: address.into(),
            host_rate: None,
            modes: vec![BookingMode::ParkNow, BookingMode::Reserve],
        }
    }

    pub fn with_host_rate(mut self, host_rate: Decimal) -> Self {
        self.host_rate = Some(host_rate);
        self
    }

    /// Like [`with_host_rate`](Self::with_host_rate) for float-typed sources;
    /// NaN and infinities leave the rate unset.
    pub fn with_host_rate_f64(mut self, host_rate: f64) -> Self {
        self.host_rate = host_rate_from_f64(host_rate);
        self
    }

    pub fn with_modes(mut self, modes: Vec<BookingMode>) -> Self {
        self.modes = modes;
        self
    }

    pub fn accepts(&self, mode: BookingMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Prices a booking of this listing.
    pub fn quote(
        &self,
        engine: &Engine,
        mode: BookingMode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingPriceBreakdown {
        engine.compute_booking(&BookingRequest {
            mode,
            start,
            end,
            host_rate: self.host_rate,
        })
    }
}

/// Receives the listing slice after every change to a [`ListingStore`].
pub trait ListingObserver: Send + Sync {
    fn listings_changed(&self, listings: &[Listing]);
}

impl<F> ListingObserver for F
where
    F: Fn(&[Listing]) + Send + Sync,
{
    fn listings_changed(&self, listings: &[Listing]) {
        self(listings)
    }
}

/// Handle returned by [`ListingStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct ListingStore {
    listings: Vec<Listing>,
    observers: Vec<(SubscriptionId, Box<dyn ListingObserver>)>,
    next_subscription: u64,
}

impl fmt::Debug for ListingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingStore")
            .field("listings", &self.listings)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, id: Uuid) -> Option<&Listing> {
        self.listings.iter().find(|listing| listing.id == id)
    }

    /// Adds a listing, replacing any listing with the same id.
    pub fn add(&mut self, listing: Listing) -> Uuid {
        let id = listing.id;
        match self.listings.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => *existing = listing,
            None => self.listings.push(listing),
        }
        self.notify();
        id
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Listing> {
        let index = self.listings.iter().position(|listing| listing.id == id)?;
        let removed = self.listings.remove(index);
        self.notify();
        Some(removed)
    }

    pub fn set_host_rate(
        &mut self,
        id: Uuid,
        host_rate: Option<Decimal>,
    ) -> Result<(), EngineError> {
        let listing = self
            .listings
            .iter_mut()
            .find(|listing| listing.id == id)
            .ok_or_else(|| EngineError::ListingNotFound(id.to_string()))?;
        listing.host_rate = host_rate;
        self.notify();
        Ok(())
    }

    /// Registers an observer. It is not called until the next change.
    pub fn subscribe(&mut self, observer: impl ListingObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        tracing::trace!(
            listings = self.listings.len(),
            observers = self.observers.len(),
            "listings changed"
        );
        for (_, observer) in &self.observers {
            observer.listings_changed(&self.listings);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<usize>>>, impl Fn(&[Listing]) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |listings: &[Listing]| {
            sink.lock().unwrap().push(listings.len())
        })
    }

    #[test]
    fn observers_see_every_change() {
        let mut store = ListingStore::new();
        let (seen, observer) = recorder();
        store.subscribe(observer);

        let first = store.add(Listing::new("Garage", "12 Downtown St"));
        store.add(Listing::new("Driveway", "4 Elm Rd"));
        store.set_host_rate(first, Some(dec!(3.5))).unwrap();
        store.remove(first);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2, 1]);
        assert_eq!(store.listings().len(), 1);
        assert!(store.get(first).is_none());
    }

    #[test]
    fn unsubscribed_observers_stop_receiving() {
        let mut store = ListingStore::new();
        let (seen, observer) = recorder();
        let id = store.subscribe(observer);

        store.add(Listing::new("Lot", "Arena Way"));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add(Listing::new("Lot 2", "Arena Way"));

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn adding_same_id_replaces() {
        let mut store = ListingStore::new();
        let listing = Listing::new("Garage", "Main St");
        let id = store.add(listing.clone());
        store.add(Listing {
            title: "Covered garage".to_string(),
            ..listing
        });

        assert_eq!(store.listings().len(), 1);
        assert_eq!(store.get(id).unwrap().title, "Covered garage");
    }

    #[test]
    fn missing_listing_is_an_error() {
        let mut store = ListingStore::new();
        let (seen, observer) = recorder();
        store.subscribe(observer);

        let missing = Uuid::new_v4();
        assert_eq!(
            store.set_host_rate(missing, None),
            Err(EngineError::ListingNotFound(missing.to_string()))
        );
        assert!(store.remove(missing).is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn listing_quotes_through_the_engine() {
        let engine = Engine::builder().build();
        let start = DateTime::parse_from_rfc3339("2025-06-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let cheap = Listing::new("Curb", "Elm St").with_host_rate(dec!(1.25));
        let quote = cheap.quote(&engine, BookingMode::ParkNow, start, start + TimeDelta::hours(1));
        assert_eq!(quote.hourly_rate.to_string(), "2.00");
        assert!(quote.minimum_charge_applied);

        let unpriced = Listing::new("Curb", "Elm St").with_host_rate_f64(f64::NAN);
        assert_eq!(unpriced.host_rate, None);
        let quote =
            unpriced.quote(&engine, BookingMode::Reserve, start, start + TimeDelta::hours(2));
        assert_eq!(quote.subtotal.to_string(), "4.50");
    }

    #[test]
    fn store_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ListingStore>();

        let store = Arc::new(Mutex::new(ListingStore::new()));
        let (seen, observer) = recorder();
        store.lock().unwrap().subscribe(observer);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .lock()
                        .unwrap()
                        .add(Listing::new(format!("Spot {i}"), "Elm St"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.lock().unwrap().listings().len(), 4);
        let mut counts = seen.lock().unwrap().clone();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2, 3, 4]);
    }

    #[test]
    fn modes_default_to_both() {
        let listing = Listing::new("Lot", "Stadium Rd");
        assert!(listing.accepts(BookingMode::ParkNow));
        let reserve_only = listing.with_modes(vec![BookingMode::Reserve]);
        assert!(!reserve_only.accepts(BookingMode::ParkNow));
    }
}

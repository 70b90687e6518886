use std::cmp::Ordering;
use std::time::Duration;

use serde::Serialize;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::geo::haversine_km;
use crate::models::driver::{Driver, GeoPoint};

#[derive(Debug, Clone, Serialize)]
pub struct CarouselEntry {
    pub driver_id: Uuid,
    pub name: String,
    pub vehicle: String,
    pub plate: String,
    pub rating: f64,
    pub total_rides: u32,
    pub distance_km: Option<f64>,
}

impl CarouselEntry {
    fn from_driver(driver: &Driver, origin: Option<&GeoPoint>) -> Self {
        let distance_km = match (origin, driver.location.as_ref()) {
            (Some(origin), Some(location)) => Some(haversine_km(origin, location)),
            _ => None,
        };

        Self {
            driver_id: driver.id,
            name: driver.name.clone(),
            vehicle: format!(
                "{} {} {}",
                driver.vehicle.color, driver.vehicle.make, driver.vehicle.model
            ),
            plate: driver.vehicle.plate.clone(),
            rating: driver.rating,
            total_rides: driver.total_rides,
            distance_km,
        }
    }
}

/// Online, verified drivers ordered for display: best rated first, then
/// nearest to `origin` when one is given, then by name.
pub fn eligible<'a, I>(drivers: I, origin: Option<&GeoPoint>) -> Vec<CarouselEntry>
where
    I: IntoIterator<Item = &'a Driver>,
{
    let mut entries: Vec<CarouselEntry> = drivers
        .into_iter()
        .filter(|driver| driver.online && driver.verified)
        .map(|driver| CarouselEntry::from_driver(driver, origin))
        .collect();

    entries.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| compare_distance(a.distance_km, b.distance_km))
            .then_with(|| a.name.cmp(&b.name))
    });

    entries
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Index rotation over a list of `len` entries that wraps in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    index: usize,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub fn starting_at(len: usize, index: usize) -> Self {
        let mut carousel = Self::new(len);
        carousel.index = if len == 0 { 0 } else { index % len };
        carousel
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.index)
    }

    pub fn advance(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.len;
        Some(self.index)
    }

    pub fn retreat(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.index = (self.index + self.len - 1) % self.len;
        Some(self.index)
    }

    /// The underlying list changed size; keep the index in range.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if len == 0 || self.index >= len {
            self.index = 0;
        }
    }
}

/// One autoplay step: the featured item and where it sits in the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Featured<T> {
    pub index: usize,
    pub total: usize,
    pub featured: T,
}

/// Features the next item once per `period`, starting immediately at 0.
///
/// `load` runs on every tick so the rotation follows the list as it grows or
/// shrinks. Ticks over an empty list yield nothing.
pub fn autoplay<T, F>(period: Duration, mut load: F) -> impl Stream<Item = Featured<T>>
where
    F: FnMut() -> Vec<T>,
{
    let mut carousel = Carousel::new(0);

    IntervalStream::new(tokio::time::interval(period)).filter_map(move |_| {
        let items = load();
        let total = items.len();
        carousel.resize(total);

        let index = carousel.current()?;
        carousel.advance();
        items.into_iter().nth(index).map(|featured| Featured {
            index,
            total,
            featured,
        })
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio_stream::StreamExt;
    use uuid::Uuid;

    use super::*;
    use crate::models::driver::Vehicle;

    fn driver(seed: u128, name: &str, rating: f64, online: bool, verified: bool) -> Driver {
        Driver {
            id: Uuid::from_u128(seed),
            name: name.to_string(),
            phone: "0700000000".to_string(),
            whatsapp: None,
            vehicle: Vehicle {
                make: "Toyota".to_string(),
                model: "Axio".to_string(),
                plate: format!("KDA {seed:03}A"),
                color: "Silver".to_string(),
                seats: 4,
            },
            location: None,
            online,
            verified,
            rating,
            rating_count: 0,
            total_rides: 0,
            documents: Vec::new(),
            payment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn advancing_len_times_returns_to_start() {
        for len in 1..6 {
            let mut carousel = Carousel::starting_at(len, 2);
            let start = carousel.current();
            for _ in 0..len {
                carousel.advance();
            }
            assert_eq!(carousel.current(), start);
        }
    }

    #[test]
    fn retreating_from_zero_wraps_to_last() {
        let mut carousel = Carousel::new(4);
        assert_eq!(carousel.retreat(), Some(3));
        assert_eq!(carousel.advance(), Some(0));
    }

    #[test]
    fn empty_carousel_has_no_current_index() {
        let mut carousel = Carousel::new(0);
        assert_eq!(carousel.current(), None);
        assert_eq!(carousel.advance(), None);
        assert_eq!(carousel.retreat(), None);
    }

    #[test]
    fn resize_keeps_index_in_range() {
        let mut carousel = Carousel::starting_at(5, 4);
        carousel.resize(3);
        assert_eq!(carousel.current(), Some(0));
        carousel.resize(0);
        assert_eq!(carousel.current(), None);
    }

    #[test]
    fn only_online_verified_drivers_are_listed_best_rated_first() {
        let drivers = vec![
            driver(1, "Otieno", 4.2, true, true),
            driver(2, "Kamau", 4.9, true, true),
            driver(3, "Achieng", 5.0, false, true),
            driver(4, "Mutua", 4.7, true, false),
        ];

        let entries = eligible(&drivers, None);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Kamau", "Otieno"]);
    }

    #[test]
    fn equal_ratings_are_ordered_by_distance() {
        let origin = GeoPoint {
            lat: -1.2864,
            lng: 36.8172,
        };
        let mut far = driver(1, "Far", 4.5, true, true);
        far.location = Some(GeoPoint {
            lat: -1.22,
            lng: 36.89,
        });
        let mut near = driver(2, "Near", 4.5, true, true);
        near.location = Some(GeoPoint {
            lat: -1.29,
            lng: 36.82,
        });
        let unknown = driver(3, "Aaron", 4.5, true, true);

        let drivers = [far, near, unknown];
        let entries = eligible(&drivers, Some(&origin));
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far", "Aaron"]);
    }

    #[tokio::test]
    async fn autoplay_cycles_through_indices() {
        let ticks: Vec<usize> = autoplay(Duration::from_millis(1), || vec!["a", "b", "c"])
            .map(|frame| frame.index)
            .take(5)
            .collect()
            .await;
        assert_eq!(ticks, vec![0, 1, 2, 0, 1]);
    }

    #[tokio::test]
    async fn autoplay_follows_a_shrinking_list() {
        let mut sizes = vec![1, 3, 3, 2].into_iter();
        let frames: Vec<Featured<usize>> =
            autoplay(Duration::from_millis(1), move || (0..sizes.next().unwrap_or(2)).collect())
                .take(4)
                .collect()
                .await;

        let seen: Vec<(usize, usize)> = frames.iter().map(|f| (f.index, f.total)).collect();
        assert_eq!(seen, vec![(0, 1), (0, 3), (1, 3), (0, 2)]);
    }

    #[tokio::test]
    async fn autoplay_over_nothing_stays_quiet() {
        let frames = autoplay(Duration::from_millis(1), Vec::<usize>::new);
        tokio::pin!(frames);

        let next = tokio::time::timeout(Duration::from_millis(20), frames.next()).await;
        assert!(next.is_err());
    }
}

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::rest::bookings::can_view;
use crate::api::rest::drivers::{carousel_entries, carousel_origin};
use crate::engine::carousel::autoplay;
use crate::error::AppError;
use crate::models::driver::GeoPoint;
use crate::session::Session;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookingFeedQuery {
    pub booking_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CarouselFeedQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn bookings_ws(
    session: Session,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingFeedQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let (sender, receiver) = socket.split();
        stream_bookings(sender, receiver, state, session, query.booking_id)
    })
}

pub async fn carousel_ws(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CarouselFeedQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let origin = carousel_origin(query.lat, query.lng)?;
    Ok(ws.on_upgrade(move |socket| {
        let (sender, receiver) = socket.split();
        stream_carousel(sender, receiver, state, origin)
    }))
}

/// Waits for either half of a connection to finish and stops the other, so
/// nothing keeps running once the client is gone.
async fn until_closed(mut send_task: JoinHandle<()>, mut recv_task: JoinHandle<()>) {
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }
}

/// Drains client frames until the client closes.
fn drain<R, E>(mut receiver: R) -> JoinHandle<()>
where
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
{
    tokio::spawn(async move { while let Some(Ok(_msg)) = receiver.next().await {} })
}

async fn stream_bookings<S, R, E>(
    mut sender: S,
    receiver: R,
    state: Arc<AppState>,
    session: Session,
    booking_id: Option<Uuid>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
{
    let mut rx = state.booking_events_tx.subscribe();

    info!(user_id = %session.user_id, booking_id = ?booking_id, "booking listener connected");

    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "booking listener lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if booking_id.is_some_and(|id| id != event.booking_id) {
                continue;
            }
            if !can_view(&session, &event.booking) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize booking event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    until_closed(send_task, drain(receiver)).await;

    info!(user_id = %session.user_id, booking_id = ?booking_id, "booking listener disconnected");
}

async fn stream_carousel<S, R, E>(
    mut sender: S,
    receiver: R,
    state: Arc<AppState>,
    origin: Option<GeoPoint>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
{
    let period = Duration::from_millis(state.settings.carousel_interval_ms.max(1));

    info!("carousel listener connected");

    let send_task = tokio::spawn(async move {
        // Eligible drivers are re-read on every tick.
        let frames = autoplay(period, move || carousel_entries(&state, origin.as_ref()));
        tokio::pin!(frames);

        while let Some(frame) = frames.next().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize carousel frame for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    until_closed(send_task, drain(receiver)).await;

    info!("carousel listener disconnected");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use futures::channel::mpsc;

    use super::*;
    use crate::email::HttpEmailSender;
    use crate::models::booking::{Booking, BookingStatus, RideStatus};
    use crate::models::user::Role;
    use crate::state::Settings;

    type ClientFrames = mpsc::UnboundedSender<Result<Message, axum::Error>>;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            16,
            Settings {
                carousel_interval_ms: 1,
                ..Settings::default()
            },
            Arc::new(HttpEmailSender::new(Default::default())),
        ))
    }

    fn connection() -> (
        mpsc::UnboundedSender<Message>,
        mpsc::UnboundedReceiver<Message>,
        ClientFrames,
        mpsc::UnboundedReceiver<Result<Message, axum::Error>>,
    ) {
        let (to_client, from_server) = mpsc::unbounded();
        let (client, from_client) = mpsc::unbounded();
        (to_client, from_server, client, from_client)
    }

    fn booking(customer_id: Uuid) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            customer_id,
            customer_name: "Wanjiru".to_string(),
            customer_phone: "254712345678".to_string(),
            pickup_location: "Westlands".to_string(),
            destination: "JKIA".to_string(),
            pickup_coords: None,
            destination_coords: None,
            pickup_date: "2026-10-20".to_string(),
            pickup_time: "08:30".to_string(),
            status: BookingStatus::Pending,
            ride_status: RideStatus::Pending,
            accepted_by: None,
            driver_location: None,
            eta: None,
            fare: None,
            rating: None,
            review: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn wait_for(mut ready: impl FnMut() -> bool) {
        for _ in 0..200 {
            if ready() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn closed_booking_listener_releases_its_subscription() {
        let state = state();
        let session = Session {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        };
        let (to_client, _from_server, client, from_client) = connection();

        let listener = tokio::spawn(stream_bookings(
            to_client,
            from_client,
            state.clone(),
            session,
            Some(Uuid::new_v4()),
        ));
        wait_for(|| state.booking_events_tx.receiver_count() == 1).await;

        drop(client);
        listener.await.unwrap();

        assert_eq!(state.booking_events_tx.receiver_count(), 0);
        assert_eq!(Arc::strong_count(&state), 1);
    }

    #[tokio::test]
    async fn booking_listener_only_sees_visible_bookings() {
        let state = state();
        let customer = Uuid::new_v4();
        let session = Session {
            user_id: customer,
            role: Role::Customer,
        };
        let (to_client, mut from_server, client, from_client) = connection();

        let listener = tokio::spawn(stream_bookings(
            to_client,
            from_client,
            state.clone(),
            session,
            None,
        ));
        wait_for(|| state.booking_events_tx.receiver_count() == 1).await;

        let stranger = booking(Uuid::new_v4());
        let own = booking(customer);
        state.publish(&stranger);
        state.publish(&own);

        let Some(Message::Text(json)) = from_server.next().await else {
            panic!("expected a text frame");
        };
        let event: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(event["booking_id"], own.id.to_string());

        drop(client);
        listener.await.unwrap();
        assert!(from_server.next().await.is_none());
    }

    #[tokio::test]
    async fn closed_carousel_listener_stops_ticking() {
        let state = state();
        let (to_client, _from_server, client, from_client) = connection();

        let listener = tokio::spawn(stream_carousel(to_client, from_client, state.clone(), None));
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(client);
        listener.await.unwrap();

        assert_eq!(Arc::strong_count(&state), 1);
    }
}

use actix_web::{
    HttpRequest, HttpResponse, get,
    web::{Bytes, Data, ServiceConfig},
};
use futures_util::stream::{self, Stream, StreamExt};
use sqlx::{Pool, Postgres};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::api::provider::ProviderService;
use crate::area::LocationPredicate;
use crate::db::customer_repository::CustomerRepository;
use crate::events::{Count, Event, EventBus};

/// Live change feed as Server-Sent Events
///
/// Opens with a `customerCount` frame. A caller presenting a provider
/// token only receives job and booking events for its service area.
#[get("/api/events")]
async fn event_stream(
    req: HttpRequest,
    pool: Data<Pool<Postgres>>,
    bus: Data<EventBus>,
    providers: Data<ProviderService>,
) -> HttpResponse {
    let rx = bus.subscribe();
    let scope = providers
        .identify(&req)
        .await
        .map(|provider| LocationPredicate::for_service_area(&provider.service_area));

    let greeting = match CustomerRepository::count(&pool).await {
        Ok(count) => frame_for(&Event::CustomerCount(Count { count }), None),
        Err(e) => {
            warn!("Could not count customers for new subscriber: {}", e);
            None
        }
    };

    info!(
        "SSE subscriber connected (scoped={}, subscribers={})",
        scope.is_some(),
        bus.subscriber_count()
    );

    let opening = stream::iter(greeting.map(|frame| Ok::<_, actix_web::Error>(Bytes::from(frame))));
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(opening.chain(live_frames(rx, scope)))
}

/// Frames for every event this subscriber may see, until the bus closes.
fn live_frames(
    rx: broadcast::Receiver<Event>,
    scope: Option<LocationPredicate>,
) -> impl Stream<Item = Result<Bytes, actix_web::Error>> {
    stream::unfold((rx, scope), |(mut rx, scope)| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(frame) = frame_for(&event, scope.as_ref()) {
                        return Some((Ok(Bytes::from(frame)), (rx, scope)));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE subscriber fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

fn frame_for(event: &Event, scope: Option<&LocationPredicate>) -> Option<String> {
    if scope.is_some_and(|predicate| !event.visible_to(predicate)) {
        return None;
    }
    match event.to_sse_frame() {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!("Dropping {} event that failed to serialize: {}", event.name(), e);
            None
        }
    }
}

pub fn events_config(config: &mut ServiceConfig) {
    config.service(event_stream);
}

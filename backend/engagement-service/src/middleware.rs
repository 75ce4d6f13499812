/// Request identity for engagement-service.
///
/// Authentication happens at the gateway, which forwards the caller's id in
/// the `x-user-id` header.
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::ServiceError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub Uuid);

impl ActorId {
    fn from_headers(req: &HttpRequest) -> Result<Self, ServiceError> {
        let raw = req
            .headers()
            .get(USER_ID_HEADER)
            .ok_or_else(|| ServiceError::Unauthorized("missing x-user-id header".to_string()))?
            .to_str()
            .map_err(|_| ServiceError::Unauthorized("invalid x-user-id header".to_string()))?;

        Uuid::parse_str(raw.trim())
            .map(ActorId)
            .map_err(|_| ServiceError::Unauthorized("invalid x-user-id header".to_string()))
    }
}

/// Caller identity for routes that also serve anonymous requests.
///
/// An absent header is anonymous; a present but malformed one is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalActor(pub Option<Uuid>);

impl FromRequest for OptionalActor {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = if req.headers().contains_key(USER_ID_HEADER) {
            ActorId::from_headers(req).map(|actor| OptionalActor(Some(actor.0)))
        } else {
            Ok(OptionalActor(None))
        };
        ready(result)
    }
}

impl FromRequest for ActorId {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn extracts_valid_header() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();

        let actor = ActorId::extract(&req).await.unwrap();
        assert_eq!(actor, ActorId(id));
    }

    #[actix_web::test]
    async fn optional_actor_is_anonymous_only_without_header() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(OptionalActor::extract(&req).await.unwrap(), OptionalActor(None));

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "garbage"))
            .to_http_request();
        assert!(matches!(
            OptionalActor::extract(&req).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn rejects_missing_or_malformed() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            ActorId::extract(&req).await,
            Err(ServiceError::Unauthorized(_))
        ));

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "nope"))
            .to_http_request();
        assert!(matches!(
            ActorId::extract(&req).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }
}

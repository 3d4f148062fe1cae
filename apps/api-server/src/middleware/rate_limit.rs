//! Rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use forge_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use forge_core::ports::RateLimiter;

/// Rate limiting middleware factory. Requests are keyed by client address.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        Box::pin(async move {
            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    let wait_secs = result.reset_after.as_secs().max(1);
                    tracing::warn!(client = %key, wait_secs, "Rate limit exceeded");

                    let error = ErrorResponse::too_many_requests(format!(
                        "Rate limit exceeded. Try again in {} seconds.",
                        wait_secs
                    ));
                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header((header::RETRY_AFTER, wait_secs.to_string()))
                        .json(error);

                    let (http_req, _payload) = req.into_parts();
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
                Ok(result) => {
                    let mut res = service.call(req).await?;
                    res.headers_mut().insert(
                        header::HeaderName::from_static("x-ratelimit-remaining"),
                        header::HeaderValue::from(result.remaining),
                    );
                    Ok(res.map_into_left_body())
                }
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
            }
        })
    }
}

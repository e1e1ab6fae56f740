use super::content_service::content_service_server::ContentService as GrpcContentService;
use super::{convert, proto};
use crate::service::ContentService;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// gRPC implementation backed by the shared [`ContentService`].
///
/// The HTTP gateway calls this same type in-process so both protocols share
/// request decoding and error mapping.
#[derive(Clone)]
pub struct ContentRpc {
    service: Arc<ContentService>,
}

impl ContentRpc {
    pub fn new(service: Arc<ContentService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<ContentService> {
        &self.service
    }
}

#[tonic::async_trait]
impl GrpcContentService for ContentRpc {
    async fn healthz(
        &self,
        _request: Request<proto::HealthzIdRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.service.healthz();
        Ok(Response::new(proto::Empty {}))
    }

    async fn get_content_by_slug(
        &self,
        request: Request<proto::ContentRequest>,
    ) -> Result<Response<proto::Content>, Status> {
        let slug = request.into_inner().slug;
        let envelope = self.service.get_content_by_slug(&slug).await?;
        Ok(Response::new(convert::envelope_to_proto(&envelope)))
    }

    async fn get_content(
        &self,
        request: Request<proto::ContentIdRequest>,
    ) -> Result<Response<proto::Content>, Status> {
        let envelope = self.service.get_content(request.into_inner().id).await?;
        Ok(Response::new(convert::envelope_to_proto(&envelope)))
    }

    async fn store_content(
        &self,
        request: Request<proto::StoreContentRequest>,
    ) -> Result<Response<proto::Content>, Status> {
        let attributes = convert::store_request(request.into_inner())?;
        let envelope = self.service.store_content(attributes).await?;
        Ok(Response::new(convert::envelope_to_proto(&envelope)))
    }

    async fn update_content(
        &self,
        request: Request<proto::UpdateContentRequest>,
    ) -> Result<Response<proto::Content>, Status> {
        let (id, attributes) = convert::update_request(request.into_inner())?;
        let envelope = self.service.update_content(id, attributes).await?;
        Ok(Response::new(convert::envelope_to_proto(&envelope)))
    }

    async fn delete_content(
        &self,
        request: Request<proto::ContentIdRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        self.service.delete_content(request.into_inner().id).await?;
        Ok(Response::new(proto::Empty {}))
    }
}

pub mod create;
pub mod view;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

/// 作业入口。
pub struct AssignmentService;

impl AssignmentService {
    // 创建作业（multipart 表单，可带 PDF 附件）
    pub async fn create_assignment(
        &self,
        payload: Multipart,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(payload, request).await
    }

    // 查看作业详情
    pub async fn view_assignment(
        &self,
        assignment_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        view::view_assignment(assignment_id, request).await
    }
}

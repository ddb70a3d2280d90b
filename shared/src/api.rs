//! 类型化的后端接口
//!
//! 每个方法对应一个 REST 端点；写操作返回服务端的完整表示，
//! 调用方用它直接替换本地副本，而不是重新拉取列表。

use crate::calendar::CalendarIndex;
use crate::dashboard::DashboardData;
use crate::error::{ApiError, ApiErrorKind, ApiResult, MSG_BAD_CREDENTIALS};
use crate::gateway::{ApiGateway, ApiRequest};
use crate::listing::{CaseFilters, Page, extend_unique};
use crate::protocol::{
    ActuacionDraft, AlertaDraft, AvisoDraft, CaseDraft, CasePatch, ClientDraft, LoginRequest,
    LoginResponse, NewUser, NoteDraft, TagDraft, TemplateDraft, Validate,
};
use crate::request::HttpClient;
use crate::session::SessionStore;
use crate::{
    ALERT_FEED_PAGE_SIZE, Actuacion, ActuacionTemplate, Alerta, Aviso, Case, Client, Id,
    Identified, Note, Tag, User,
};
use serde::de::DeserializeOwned;

pub const LOGIN_PATH: &str = "/auth/login/";
pub const ME_PATH: &str = "/auth/me/";

/// 导出文件名
pub const EXPORT_CASES_FILENAME: &str = "expedientes.xlsx";

/// 逐页拉取时的分页上限
pub const MAX_LIST_PAGES: usize = 100;

pub fn timeline_filename(codigo_interno: &str) -> String {
    let code = codigo_interno.trim();
    if code.is_empty() {
        "timeline.xlsx".to_string()
    } else {
        format!("timeline_{}.xlsx", code)
    }
}

/// 案件详情页需要的查找表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookups {
    pub clientes: Vec<Client>,
    pub tags: Vec<Tag>,
    pub templates: Vec<ActuacionTemplate>,
}

pub struct EstudioApi<C, S> {
    gateway: ApiGateway<C, S>,
}

impl<C, S> Clone for EstudioApi<C, S> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<C: HttpClient, S: SessionStore> EstudioApi<C, S> {
    pub fn new(gateway: ApiGateway<C, S>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ApiGateway<C, S> {
        &self.gateway
    }

    // =========================================================
    // 认证
    // =========================================================

    /// 登录成功后保存令牌与用户
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        body.validate()?;

        let req = ApiRequest::post(LOGIN_PATH).json(&body)?;
        let resp = self.gateway.send_anonymous(&req).await?;
        if !resp.ok() {
            let message = crate::error::extract_error_message(&resp.body)
                .unwrap_or_else(|| MSG_BAD_CREDENTIALS.to_string());
            return Err(ApiError::authentication(message).with_status(resp.status));
        }

        let data: LoginResponse = resp.json()?;
        let store = self.gateway.store();
        store.set_tokens(&data.access, Some(&data.refresh));
        store.set_current_user(&data.user);
        Ok(data.user)
    }

    pub fn logout(&self) {
        self.gateway.store().clear();
    }

    pub fn stored_user(&self) -> Option<User> {
        self.gateway.store().current_user()
    }

    /// 用存储的会话向服务端确认身份
    ///
    /// 没有存储的用户时不发请求；校验失败清空会话。
    pub async fn current_user(&self) -> Option<User> {
        self.stored_user()?;
        match self.gateway.fetch::<User>(&ApiRequest::get(ME_PATH)).await {
            Ok(user) => {
                self.gateway.store().set_current_user(&user);
                Some(user)
            }
            Err(_) => {
                self.gateway.store().clear();
                None
            }
        }
    }

    // =========================================================
    // 案件
    // =========================================================

    pub async fn list_cases(&self, filters: &CaseFilters, page: usize) -> ApiResult<Page<Case>> {
        let req = ApiRequest::get("/cases/")
            .query_pairs(filters.to_query())
            .query("page", page.max(1));
        self.gateway.fetch(&req).await
    }

    /// 依次拉取所有分页
    pub async fn all_cases(&self, filters: &CaseFilters) -> ApiResult<Vec<Case>> {
        self.collect_pages("/cases/", filters.to_query()).await
    }

    /// 沿 `next` 逐页拉取并按 id 去重
    ///
    /// 最多 `MAX_LIST_PAGES` 页，防止服务端 `next` 不收敛时死循环；
    /// 不分页的端点返回裸数组，第一页即结束。
    async fn collect_pages<T>(&self, path: &str, query: Vec<(String, String)>) -> ApiResult<Vec<T>>
    where
        T: DeserializeOwned + Identified,
    {
        let mut items = Vec::new();
        for page in 1..=MAX_LIST_PAGES {
            let req = ApiRequest::get(path)
                .query_pairs(query.clone())
                .query("page", page);
            let batch: Page<T> = self.gateway.fetch(&req).await?;
            let more = batch.has_next() && !batch.results.is_empty();
            extend_unique(&mut items, batch.results);
            if !more {
                break;
            }
        }
        Ok(items)
    }

    pub async fn get_case(&self, id: Id) -> ApiResult<Case> {
        self.gateway
            .fetch(&ApiRequest::get(format!("/cases/{}/", id)))
            .await
    }

    pub async fn create_case(&self, draft: &CaseDraft) -> ApiResult<Case> {
        draft.validate()?;
        self.gateway
            .fetch(&ApiRequest::post("/cases/").json(draft)?)
            .await
    }

    /// 局部更新；修改负责律师只允许管理员发起
    pub async fn update_case(&self, id: Id, patch: &CasePatch, actor: &User) -> ApiResult<Case> {
        if patch.touches_lawyer() && !actor.is_admin() {
            return Err(ApiError::forbidden());
        }
        patch.validate()?;
        self.gateway
            .fetch(&ApiRequest::patch(format!("/cases/{}/", id)).json(patch)?)
            .await
    }

    pub async fn delete_case(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/cases/{}/", id)))
            .await
    }

    // =========================================================
    // 子集合
    // =========================================================

    pub async fn add_actuacion(&self, case_id: Id, draft: &ActuacionDraft) -> ApiResult<Actuacion> {
        draft.validate()?;
        let req = ApiRequest::post(format!("/cases/{}/add_actuacion/", case_id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn update_actuacion(&self, id: Id, draft: &ActuacionDraft) -> ApiResult<Actuacion> {
        draft.validate()?;
        let req = ApiRequest::patch(format!("/actuaciones/{}/", id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn delete_actuacion(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/actuaciones/{}/", id)))
            .await
    }

    pub async fn add_alerta(&self, case_id: Id, draft: &AlertaDraft) -> ApiResult<Alerta> {
        draft.validate()?;
        let req = ApiRequest::post(format!("/cases/{}/add_alerta/", case_id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn update_alerta(&self, id: Id, draft: &AlertaDraft) -> ApiResult<Alerta> {
        draft.validate()?;
        let req = ApiRequest::patch(format!("/alertas/{}/", id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    /// 切换完成状态；完成人与完成时间由服务端写入或清除
    pub async fn toggle_alerta(&self, id: Id) -> ApiResult<Alerta> {
        self.gateway
            .fetch(&ApiRequest::post(format!("/alertas/{}/toggle_cumplida/", id)))
            .await
    }

    pub async fn delete_alerta(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/alertas/{}/", id)))
            .await
    }

    /// 仪表盘提醒流
    pub async fn alert_feed(&self, page: usize) -> ApiResult<Page<Alerta>> {
        let req = ApiRequest::get("/alertas/")
            .query("page_size", ALERT_FEED_PAGE_SIZE)
            .query("page", page.max(1));
        self.gateway.fetch(&req).await
    }

    pub async fn all_alertas(&self) -> ApiResult<Vec<Alerta>> {
        self.collect_pages("/alertas/", Vec::new()).await
    }

    pub async fn all_actuaciones(&self) -> ApiResult<Vec<Actuacion>> {
        self.collect_pages("/actuaciones/", Vec::new()).await
    }

    /// 日历数据：案件列表不含子集合，alertas 与 actuaciones 另行拉取后按 `caso` 归类
    pub async fn calendar(&self) -> ApiResult<CalendarIndex> {
        let filters = CaseFilters::default();
        let (cases, alertas, actuaciones) = futures::try_join!(
            self.all_cases(&filters),
            self.all_alertas(),
            self.all_actuaciones()
        )?;
        Ok(CalendarIndex::from_records(&cases, &alertas, &actuaciones))
    }

    pub async fn add_note(&self, case_id: Id, draft: &NoteDraft) -> ApiResult<Note> {
        draft.validate()?;
        let req = ApiRequest::post(format!("/cases/{}/add_note/", case_id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn update_note(&self, id: Id, draft: &NoteDraft) -> ApiResult<Note> {
        draft.validate()?;
        let req = ApiRequest::patch(format!("/notas/{}/", id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn delete_note(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/notas/{}/", id)))
            .await
    }

    // =========================================================
    // 用户
    // =========================================================

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let page: Page<User> = self.gateway.fetch(&ApiRequest::get("/users/")).await?;
        Ok(page.results)
    }

    pub async fn create_user(&self, user: &NewUser) -> ApiResult<User> {
        user.validate()?;
        self.gateway
            .fetch(&ApiRequest::post("/users/").json(user)?)
            .await
    }

    pub async fn delete_user(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/users/{}/", id)))
            .await
    }

    // =========================================================
    // 客户
    // =========================================================

    pub async fn list_clients(&self, search: &str) -> ApiResult<Vec<Client>> {
        let req = ApiRequest::get("/clientes/").query("search", search);
        let page: Page<Client> = self.gateway.fetch(&req).await?;
        Ok(page.results)
    }

    pub async fn get_client(&self, id: Id) -> ApiResult<Client> {
        self.gateway
            .fetch(&ApiRequest::get(format!("/clientes/{}/", id)))
            .await
    }

    pub async fn create_client(&self, draft: &ClientDraft) -> ApiResult<Client> {
        draft.validate()?;
        self.gateway
            .fetch(&ApiRequest::post("/clientes/").json(draft)?)
            .await
    }

    pub async fn update_client(&self, id: Id, draft: &ClientDraft) -> ApiResult<Client> {
        draft.validate()?;
        let req = ApiRequest::patch(format!("/clientes/{}/", id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn delete_client(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/clientes/{}/", id)))
            .await
    }

    // =========================================================
    // 标签
    // =========================================================

    pub async fn list_tags(&self, search: &str) -> ApiResult<Vec<Tag>> {
        let req = ApiRequest::get("/tags/").query("search", search);
        let page: Page<Tag> = self.gateway.fetch(&req).await?;
        Ok(page.results)
    }

    pub async fn create_tag(&self, draft: &TagDraft) -> ApiResult<Tag> {
        draft.validate()?;
        self.gateway
            .fetch(&ApiRequest::post("/tags/").json(draft)?)
            .await
    }

    pub async fn update_tag(&self, id: Id, draft: &TagDraft) -> ApiResult<Tag> {
        draft.validate()?;
        let req = ApiRequest::patch(format!("/tags/{}/", id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn delete_tag(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/tags/{}/", id)))
            .await
    }

    // =========================================================
    // Actuación 模板
    // =========================================================

    pub async fn list_templates(&self, tipo: &str) -> ApiResult<Vec<ActuacionTemplate>> {
        let req = ApiRequest::get("/actuacion-templates/").query("tipo", tipo);
        let page: Page<ActuacionTemplate> = self.gateway.fetch(&req).await?;
        Ok(page.results)
    }

    pub async fn create_template(&self, draft: &TemplateDraft) -> ApiResult<ActuacionTemplate> {
        draft.validate()?;
        self.gateway
            .fetch(&ApiRequest::post("/actuacion-templates/").json(draft)?)
            .await
    }

    pub async fn update_template(
        &self,
        id: Id,
        draft: &TemplateDraft,
    ) -> ApiResult<ActuacionTemplate> {
        draft.validate()?;
        let req = ApiRequest::patch(format!("/actuacion-templates/{}/", id)).json(draft)?;
        self.gateway.fetch(&req).await
    }

    pub async fn delete_template(&self, id: Id) -> ApiResult<()> {
        self.gateway
            .execute(&ApiRequest::delete(format!("/actuacion-templates/{}/", id)))
            .await
    }

    /// 并发加载客户、标签与模板
    pub async fn lookups(&self) -> ApiResult<Lookups> {
        let (clientes, tags, templates) = futures::try_join!(
            self.list_clients(""),
            self.list_tags(""),
            self.list_templates("")
        )?;
        Ok(Lookups {
            clientes,
            tags,
            templates,
        })
    }

    // =========================================================
    // 仪表盘 / 导出 / 公告
    // =========================================================

    pub async fn dashboard(&self) -> ApiResult<DashboardData> {
        self.gateway.fetch(&ApiRequest::get("/dashboard/")).await
    }

    /// 导出当前筛选条件下的案件表格（不分页）
    pub async fn export_cases(&self, filters: &CaseFilters) -> ApiResult<Vec<u8>> {
        let req = ApiRequest::get("/cases/export_excel/").query_pairs(filters.to_query());
        self.gateway
            .fetch_bytes(&req)
            .await
            .map_err(|e| export_error(e, "Error al exportar a Excel"))
    }

    pub async fn export_timeline(&self, case_id: Id) -> ApiResult<Vec<u8>> {
        let req = ApiRequest::get(format!("/cases/{}/export_timeline/", case_id));
        self.gateway
            .fetch_bytes(&req)
            .await
            .map_err(|e| export_error(e, "Error al exportar el timeline del caso"))
    }

    pub async fn post_aviso(&self, draft: &AvisoDraft, actor: &User) -> ApiResult<Option<Aviso>> {
        if !actor.is_admin() {
            return Err(ApiError::forbidden());
        }
        draft.validate()?;
        self.gateway
            .fetch_optional(&ApiRequest::post("/avisos/").json(draft)?)
            .await
    }
}

// 导出失败时服务端正文通常是二进制或 HTML，改用固定文案；会话与权限错误保持原样
fn export_error(e: ApiError, message: &str) -> ApiError {
    match e.kind {
        ApiErrorKind::Rejected | ApiErrorKind::Decode => ApiError {
            message: message.to_string(),
            ..e
        },
        _ => e,
    }
}

#[cfg(test)]
mod tests;

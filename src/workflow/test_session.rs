//! 测试会话控制器 - 流程层
//!
//! 管理一份测试从填写元信息到完成（或放弃）的完整生命周期：
//! 挂载时读取草稿决定续作还是新建 → 远端创建测试 → 逐题物化 → 完成或放弃。
//! 同一时刻最多只有一道题在编辑，由唯一的构建器槽位保证

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::clients::{TestApi, TestInput};
use crate::error::{AppResult, SessionError, ValidationError};
use crate::infrastructure::SlotBackend;
use crate::models::{DraftSnapshot, Question, QuestionKind, RemoteId};
use crate::services::preview::{render_list, PreviewIntent, QuestionPreview};
use crate::services::question_form::is_blank;
use crate::services::{DraftStore, QuestionBuilder};
use crate::workflow::QuestionCtx;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 尚未在远端创建测试
    Uninitialized,
    /// 正在远端创建测试
    Initializing,
    /// 测试已创建，可以添加题目
    Active,
    /// 有一道题正在编辑
    QuestionInProgress,
    /// 正在修改测试元信息
    EditingMetadata,
    /// 正在完成测试
    Finalizing,
    /// 已完成（终态）
    Finalized,
    /// 已放弃（终态）
    Abandoned,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Active => "active",
            SessionState::QuestionInProgress => "questionInProgress",
            SessionState::EditingMetadata => "editingMetadata",
            SessionState::Finalizing => "finalizing",
            SessionState::Finalized => "finalized",
            SessionState::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Finalized | SessionState::Abandoned)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 预览操作的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// 题目已从本地列表移除（远端实体保留）
    Removed(Question),
    /// 题目已载入构建器
    Editing,
    /// 完整预览文本
    Preview(String),
}

/// 进行中的题目
struct InProgress {
    builder: QuestionBuilder,
    /// 编辑已有题目时，成功后替换的位置
    replaces: Option<usize>,
}

/// 测试会话控制器
///
/// 职责：
/// - 独占草稿快照和已物化题目列表
/// - 每次题目物化成功或元信息保存后整体覆盖草稿
/// - 不捕获构建器的远程错误，只对成功/取消作出反应
pub struct TestSession<'a, A, B> {
    api: &'a A,
    store: &'a DraftStore<B>,
    community_id: String,
    state: SessionState,
    snapshot: DraftSnapshot,
    current: Option<InProgress>,
    /// 进入元信息编辑前最后一次保存的 (title, description)
    saved_metadata: Option<(String, String)>,
    resumed: bool,
    persisted: bool,
    publish_on_finalize: bool,
}

impl<'a, A: TestApi, B: SlotBackend> TestSession<'a, A, B> {
    /// 挂载会话：读取草稿，决定续作还是新建
    pub fn mount(api: &'a A, store: &'a DraftStore<B>, community_id: impl Into<String>) -> Self {
        let community_id = community_id.into();

        let (snapshot, state, resumed) = match store.load(&community_id) {
            Some(snapshot) => {
                let state = if snapshot.test_id.is_some() {
                    SessionState::Active
                } else {
                    SessionState::Uninitialized
                };
                info!(
                    "[社区 {}] ♻️ 恢复草稿: \"{}\" (testId={:?}, 已有 {} 题)",
                    community_id,
                    snapshot.title,
                    snapshot.test_id,
                    snapshot.questions.len()
                );
                (snapshot, state, true)
            }
            None => {
                debug!("[社区 {}] 没有可用草稿，新建会话", community_id);
                let snapshot = DraftSnapshot::new(community_id.clone(), store.now_millis());
                (snapshot, SessionState::Uninitialized, false)
            }
        };

        Self {
            api,
            store,
            community_id,
            state,
            snapshot,
            current: None,
            saved_metadata: None,
            resumed,
            persisted: resumed,
            publish_on_finalize: true,
        }
    }

    /// 完成时是否调用远端发布接口
    pub fn with_publish_on_finalize(mut self, publish: bool) -> Self {
        self.publish_on_finalize = publish;
        self
    }

    // ========== 访问器 ==========

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn snapshot(&self) -> &DraftSnapshot {
        &self.snapshot
    }

    pub fn questions(&self) -> &[Question] {
        &self.snapshot.questions
    }

    pub fn test_id(&self) -> Option<&str> {
        self.snapshot.test_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.snapshot.title
    }

    pub fn description(&self) -> &str {
        &self.snapshot.description
    }

    pub fn community_id(&self) -> &str {
        &self.community_id
    }

    /// 是否从草稿恢复
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// 元信息是否可编辑
    pub fn metadata_editable(&self) -> bool {
        matches!(
            self.state,
            SessionState::Uninitialized | SessionState::EditingMetadata
        )
    }

    pub fn builder(&self) -> Option<&QuestionBuilder> {
        self.current.as_ref().map(|c| &c.builder)
    }

    pub fn builder_mut(&mut self) -> Option<&mut QuestionBuilder> {
        self.current.as_mut().map(|c| &mut c.builder)
    }

    /// 当前题目列表的紧凑预览
    pub fn render_questions(&self) -> String {
        render_list(&self.snapshot.questions)
    }

    // ========== 测试元信息 ==========

    pub fn set_title(&mut self, title: impl Into<String>) -> AppResult<()> {
        self.ensure_metadata_editable("set_title")?;
        self.snapshot.title = title.into();
        self.persist_uninitialized_metadata();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> AppResult<()> {
        self.ensure_metadata_editable("set_description")?;
        self.snapshot.description = description.into();
        self.persist_uninitialized_metadata();
        Ok(())
    }

    /// 在远端创建测试，固定 testId
    ///
    /// 失败时回到 `Uninitialized`，由用户重新提交
    pub async fn initialize(&mut self) -> AppResult<RemoteId> {
        self.ensure_state(SessionState::Uninitialized, "initialize")?;
        if is_blank(&self.snapshot.title) {
            return Err(ValidationError::EmptyTitle.into());
        }

        self.state = SessionState::Initializing;
        info!("{} 📤 正在创建测试 \"{}\"...", self.tag(), self.snapshot.title);

        match self.api.create_test(&self.test_input()).await {
            Ok(test_id) => {
                info!("{} ✓ 测试已创建: {}", self.tag(), test_id);
                self.snapshot.test_id = Some(test_id.clone());
                self.state = SessionState::Active;
                self.persist();
                Ok(test_id)
            }
            Err(e) => {
                error!("{} ❌ 创建测试失败: {}", self.tag(), e);
                self.state = SessionState::Uninitialized;
                Err(e.into())
            }
        }
    }

    /// 进入元信息编辑子状态
    pub fn begin_metadata_edit(&mut self) -> AppResult<()> {
        self.ensure_state(SessionState::Active, "begin_metadata_edit")?;
        self.saved_metadata = Some((
            self.snapshot.title.clone(),
            self.snapshot.description.clone(),
        ));
        self.state = SessionState::EditingMetadata;
        Ok(())
    }

    /// 保存元信息：调用远端更新后覆盖草稿
    ///
    /// 失败时停留在编辑子状态
    pub async fn save_metadata(&mut self) -> AppResult<()> {
        self.ensure_state(SessionState::EditingMetadata, "save_metadata")?;
        if is_blank(&self.snapshot.title) {
            return Err(ValidationError::EmptyTitle.into());
        }
        let test_id = self.require_test_id("save_metadata")?;

        if let Err(e) = self.api.update_test(&test_id, &self.test_input()).await {
            error!("{} ❌ 更新测试信息失败: {}", self.tag(), e);
            return Err(e.into());
        }

        info!("{} ✓ 测试信息已更新", self.tag());
        self.saved_metadata = None;
        self.state = SessionState::Active;
        self.persist();
        Ok(())
    }

    /// 放弃元信息修改，恢复最后一次保存的值，不发远程请求
    pub fn cancel_metadata_edit(&mut self) -> AppResult<()> {
        self.ensure_state(SessionState::EditingMetadata, "cancel_metadata_edit")?;
        if let Some((title, description)) = self.saved_metadata.take() {
            self.snapshot.title = title;
            self.snapshot.description = description;
        }
        self.state = SessionState::Active;
        Ok(())
    }

    // ========== 题目 ==========

    /// 开始一道新题目
    pub fn begin_question(&mut self, kind: QuestionKind) -> AppResult<&mut QuestionBuilder> {
        self.ensure_can_start_question("begin_question")?;
        debug!("{} 开始新题目 [{}]", self.tag(), kind);
        Ok(self.start(QuestionBuilder::blank(kind), None))
    }

    /// 载入已物化题目进行编辑
    pub fn edit_question(&mut self, index: usize) -> AppResult<&mut QuestionBuilder> {
        self.ensure_can_start_question("edit_question")?;
        let question = self.question_at(index)?;
        let builder = QuestionBuilder::from_question(question);
        debug!("{} 编辑题目 #{}", self.tag(), index + 1);
        Ok(self.start(builder, Some(index)))
    }

    /// 提交进行中的题目
    ///
    /// 成功：题目加入列表（编辑时原位替换），覆盖草稿，释放构建器槽位，返回题目索引。
    /// 失败：状态、构建器和草稿都保持不变，错误提示留在构建器上
    pub async fn submit_question(&mut self) -> AppResult<usize> {
        self.ensure_state(SessionState::QuestionInProgress, "submit_question")?;
        let test_id = self.require_test_id("submit_question")?;
        let position = match &self.current {
            Some(current) => current.replaces.unwrap_or(self.snapshot.questions.len()),
            None => return Err(SessionError::NoQuestionInProgress.into()),
        };
        let ctx = QuestionCtx::new(self.community_id.clone(), test_id, position + 1);

        let api = self.api;
        let question = match self.current.as_mut() {
            Some(current) => current.builder.materialize(api, &ctx).await?,
            None => return Err(SessionError::NoQuestionInProgress.into()),
        };

        let replaces = self.current.take().and_then(|c| c.replaces);
        let index = match replaces {
            Some(i) if i < self.snapshot.questions.len() => {
                self.snapshot.questions[i] = question;
                i
            }
            _ => {
                self.snapshot.questions.push(question);
                self.snapshot.questions.len() - 1
            }
        };
        self.state = SessionState::Active;
        self.persist();
        info!(
            "{} ✓ 题目已加入测试 (共 {} 题)",
            ctx,
            self.snapshot.questions.len()
        );
        Ok(index)
    }

    /// 取消进行中的题目，不改动任何数据
    pub fn cancel_question(&mut self) -> AppResult<()> {
        self.ensure_state(SessionState::QuestionInProgress, "cancel_question")?;
        self.current = None;
        self.state = SessionState::Active;
        debug!("{} 已取消进行中的题目", self.tag());
        Ok(())
    }

    /// 从测试中移除题目
    ///
    /// 只修改本地列表和草稿，远端实体保留
    pub fn remove_question(&mut self, index: usize) -> AppResult<Question> {
        self.ensure_state(SessionState::Active, "remove_question")?;
        self.question_at(index)?;
        let removed = self.snapshot.questions.remove(index);
        warn!(
            "{} 题目 #{} 已从测试移除，远端实体 {} 保留",
            self.tag(),
            index + 1,
            removed.id()
        );
        self.persist();
        Ok(removed)
    }

    /// 处理预览界面发出的操作
    pub fn handle_intent(&mut self, intent: PreviewIntent) -> AppResult<IntentOutcome> {
        match intent {
            PreviewIntent::Remove(index) => self.remove_question(index).map(IntentOutcome::Removed),
            PreviewIntent::Edit(index) => {
                self.edit_question(index)?;
                Ok(IntentOutcome::Editing)
            }
            PreviewIntent::Preview(index) => {
                let question = self.question_at(index)?;
                Ok(IntentOutcome::Preview(
                    QuestionPreview::full(question, index).to_string(),
                ))
            }
        }
    }

    // ========== 结束 ==========

    /// 完成测试：远端确认成功后清除草稿
    pub async fn finalize(&mut self) -> AppResult<RemoteId> {
        self.ensure_state(SessionState::Active, "finalize")?;
        let test_id = self.require_test_id("finalize")?;

        self.state = SessionState::Finalizing;
        if self.publish_on_finalize {
            if let Err(e) = self.api.publish_test(&test_id).await {
                error!("{} ❌ 发布测试失败: {}", self.tag(), e);
                self.state = SessionState::Active;
                return Err(e.into());
            }
        }

        self.clear_draft();
        self.state = SessionState::Finalized;
        info!(
            "{} ✅ 测试已完成: {} 共 {} 题",
            self.tag(),
            test_id,
            self.snapshot.questions.len()
        );
        Ok(test_id)
    }

    /// 放弃整个测试
    ///
    /// 丢弃进行中的题目并清除草稿；已物化的远端实体保留
    pub fn abandon(&mut self) -> AppResult<()> {
        if self.state.is_terminal() {
            return Err(self.invalid("abandon").into());
        }
        if self.current.take().is_some() {
            debug!("{} 丢弃进行中的题目", self.tag());
        }
        self.clear_draft();
        self.state = SessionState::Abandoned;
        info!(
            "{} 🗑️ 已放弃测试 (远端保留 {} 题)",
            self.tag(),
            self.snapshot.questions.len()
        );
        Ok(())
    }

    /// 立即把当前快照写入草稿
    pub fn save_draft(&mut self) -> AppResult<()> {
        self.store.save(&self.snapshot)?;
        self.persisted = true;
        Ok(())
    }

    // ========== 内部 ==========

    fn start(&mut self, builder: QuestionBuilder, replaces: Option<usize>) -> &mut QuestionBuilder {
        self.state = SessionState::QuestionInProgress;
        let current = self.current.insert(InProgress { builder, replaces });
        &mut current.builder
    }

    /// 未初始化时首次写元信息即创建快照
    fn persist_uninitialized_metadata(&mut self) {
        if self.state != SessionState::Uninitialized {
            return;
        }
        if !self.persisted {
            self.snapshot.created_at = self.store.now_millis();
        }
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.save_draft() {
            warn!("{} 草稿保存失败: {}", self.tag(), e);
        }
    }

    fn clear_draft(&mut self) {
        if let Err(e) = self.store.clear(&self.community_id) {
            warn!("{} 草稿清除失败: {}", self.tag(), e);
        }
        self.persisted = false;
    }

    fn test_input(&self) -> TestInput {
        TestInput {
            title: self.snapshot.title.clone(),
            description: self.snapshot.description.clone(),
            community_id: self.community_id.clone(),
        }
    }

    fn question_at(&self, index: usize) -> Result<&Question, SessionError> {
        self.snapshot
            .questions
            .get(index)
            .ok_or(SessionError::QuestionIndexOutOfRange {
                index,
                len: self.snapshot.questions.len(),
            })
    }

    fn require_test_id(&self, action: &'static str) -> Result<RemoteId, SessionError> {
        self.snapshot
            .test_id
            .clone()
            .ok_or_else(|| self.invalid(action))
    }

    fn ensure_state(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            return Ok(());
        }
        if self.state == SessionState::QuestionInProgress {
            return Err(SessionError::QuestionInProgress);
        }
        if expected == SessionState::QuestionInProgress {
            return Err(SessionError::NoQuestionInProgress);
        }
        Err(self.invalid(action))
    }

    fn ensure_can_start_question(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::QuestionInProgress => Err(SessionError::QuestionInProgress),
            _ => Err(self.invalid(action)),
        }
    }

    fn ensure_metadata_editable(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Uninitialized | SessionState::EditingMetadata => Ok(()),
            SessionState::Active | SessionState::QuestionInProgress => {
                Err(SessionError::MetadataLocked)
            }
            _ => Err(self.invalid(action)),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidState {
            state: self.state.to_string(),
            action,
        }
    }

    fn tag(&self) -> String {
        match &self.snapshot.test_id {
            Some(test_id) => format!("[社区 {} 测试 {}]", self.community_id, test_id),
            None => format!("[社区 {}]", self.community_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::clients::{ApiOp, InMemoryApi};
    use crate::config::DEFAULT_DRAFT_TTL_MS;
    use crate::error::AppError;
    use crate::infrastructure::{ManualClock, MemorySlot};

    fn store() -> DraftStore<MemorySlot> {
        DraftStore::with_clock(
            MemorySlot::new(),
            DEFAULT_DRAFT_TTL_MS,
            Arc::new(ManualClock::new(1_000)),
        )
    }

    fn fill_mcq(builder: &mut QuestionBuilder) {
        let mcq = builder.as_mcq_mut().unwrap();
        mcq.set_body("1 + 1 = ?");
        mcq.set_option_body(0, "2").unwrap();
        mcq.set_option_body(1, "3").unwrap();
        mcq.set_correct(0, true).unwrap();
    }

    async fn active_session<'a>(
        api: &'a InMemoryApi,
        store: &'a DraftStore<MemorySlot>,
    ) -> TestSession<'a, InMemoryApi, MemorySlot> {
        let mut session = TestSession::mount(api, store, "algo101");
        session.set_title("第一周小测").unwrap();
        session.initialize().await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_metadata_is_persisted_before_initialize() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = TestSession::mount(&api, &store, "algo101");
        session.set_title("第一周小测").unwrap();
        session.set_description("数组与循环").unwrap();

        let draft = store.load("algo101").unwrap();
        assert_eq!(draft.test_id, None);
        assert_eq!(draft.description, "数组与循环");

        let resumed = TestSession::mount(&api, &store, "algo101");
        assert!(resumed.is_resumed());
        assert_eq!(resumed.state(), SessionState::Uninitialized);
        assert_eq!(resumed.title(), "第一周小测");
    }

    #[tokio::test]
    async fn test_initialize_requires_title() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = TestSession::mount(&api, &store, "algo101");

        let err = session.initialize().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptyTitle)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_failure_stays_uninitialized() {
        let api = InMemoryApi::new();
        api.fail_on(ApiOp::CreateTest, 1, "社区不存在");
        let store = store();
        let mut session = TestSession::mount(&api, &store, "algo101");
        session.set_title("小测").unwrap();

        let err = session.initialize().await.unwrap_err();
        assert_eq!(err.user_message(), "社区不存在");
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(session.test_id().is_none());

        session.initialize().await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(store.load("algo101").unwrap().test_id, session.snapshot().test_id);
    }

    #[tokio::test]
    async fn test_metadata_locked_after_initialize() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;

        assert!(matches!(
            session.set_title("改名"),
            Err(AppError::Session(SessionError::MetadataLocked))
        ));
        assert!(!session.metadata_editable());
    }

    #[tokio::test]
    async fn test_only_one_question_in_progress() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;

        session.begin_question(QuestionKind::Mcq).unwrap();
        assert!(matches!(
            session.begin_question(QuestionKind::Code),
            Err(AppError::Session(SessionError::QuestionInProgress))
        ));
        assert!(matches!(
            session.finalize().await,
            Err(AppError::Session(SessionError::QuestionInProgress))
        ));

        session.cancel_question().unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.builder().is_none());
        assert!(session.questions().is_empty());
    }

    #[tokio::test]
    async fn test_submit_appends_and_persists() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;

        fill_mcq(session.begin_question(QuestionKind::Mcq).unwrap());
        let index = session.submit_question().await.unwrap();

        assert_eq!(index, 0);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(store.load("algo101").unwrap().questions.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_question_replaces_in_place() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;
        fill_mcq(session.begin_question(QuestionKind::Mcq).unwrap());
        session.submit_question().await.unwrap();

        session
            .edit_question(0)
            .unwrap()
            .set_body("1 + 2 = ?");
        session
            .builder_mut()
            .and_then(|b| b.as_mcq_mut())
            .unwrap()
            .set_option_body(1, "3")
            .unwrap();
        let index = session.submit_question().await.unwrap();

        assert_eq!(index, 0);
        assert_eq!(session.questions().len(), 1);
        assert_eq!(session.questions()[0].body(), "1 + 2 = ?");
        assert_eq!(api.count(ApiOp::UpdateQuestion), 1);
    }

    #[tokio::test]
    async fn test_metadata_edit_save_and_cancel() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;

        session.begin_metadata_edit().unwrap();
        session.set_title("临时标题").unwrap();
        session.cancel_metadata_edit().unwrap();
        assert_eq!(session.title(), "第一周小测");
        assert_eq!(api.count(ApiOp::UpdateTest), 0);

        session.begin_metadata_edit().unwrap();
        session.set_title("第一周小测（修订）").unwrap();
        session.save_metadata().await.unwrap();
        assert_eq!(api.count(ApiOp::UpdateTest), 1);
        assert_eq!(store.load("algo101").unwrap().title, "第一周小测（修订）");
    }

    #[tokio::test]
    async fn test_failed_metadata_save_stays_in_edit_mode() {
        let api = InMemoryApi::new();
        api.fail_on(ApiOp::UpdateTest, 1, "无权限");
        let store = store();
        let mut session = active_session(&api, &store).await;

        session.begin_metadata_edit().unwrap();
        session.set_title("新标题").unwrap();
        assert!(session.save_metadata().await.is_err());
        assert_eq!(session.state(), SessionState::EditingMetadata);
        assert_eq!(store.load("algo101").unwrap().title, "第一周小测");
    }

    #[tokio::test]
    async fn test_finalize_publishes_and_clears_draft() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;
        fill_mcq(session.begin_question(QuestionKind::Mcq).unwrap());
        session.submit_question().await.unwrap();

        let test_id = session.finalize().await.unwrap();

        assert!(api.is_published(&test_id));
        assert_eq!(session.state(), SessionState::Finalized);
        assert!(store.load("algo101").is_none());
        assert!(session.abandon().is_err());
    }

    #[tokio::test]
    async fn test_abandon_twice_is_invalid_state() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;

        session.abandon().unwrap();
        let err = session.abandon().unwrap_err();

        assert!(matches!(
            err,
            AppError::Session(SessionError::InvalidState { action: "abandon", .. })
        ));
        assert_eq!(session.state(), SessionState::Abandoned);
    }

    #[tokio::test]
    async fn test_finalize_without_publish() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await.with_publish_on_finalize(false);

        session.finalize().await.unwrap();
        assert_eq!(api.count(ApiOp::PublishTest), 0);
    }

    #[tokio::test]
    async fn test_failed_publish_returns_to_active() {
        let api = InMemoryApi::new();
        api.fail_on(ApiOp::PublishTest, 1, "测试为空");
        let store = store();
        let mut session = active_session(&api, &store).await;

        assert!(session.finalize().await.is_err());
        assert_eq!(session.state(), SessionState::Active);
        assert!(store.load("algo101").is_some());
    }

    #[tokio::test]
    async fn test_preview_intents() {
        let api = InMemoryApi::new();
        let store = store();
        let mut session = active_session(&api, &store).await;
        fill_mcq(session.begin_question(QuestionKind::Mcq).unwrap());
        session.submit_question().await.unwrap();

        match session.handle_intent(PreviewIntent::Preview(0)).unwrap() {
            IntentOutcome::Preview(text) => assert!(text.contains("[x] 2")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(
            session.handle_intent(PreviewIntent::Preview(3)),
            Err(AppError::Session(SessionError::QuestionIndexOutOfRange { index: 3, len: 1 }))
        ));

        let question_id = session.questions()[0].id().to_string();
        let calls_before = api.calls().len();
        match session.handle_intent(PreviewIntent::Remove(0)).unwrap() {
            IntentOutcome::Removed(q) => assert_eq!(q.id(), question_id),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(api.calls().len(), calls_before);
        assert!(api.contains(&question_id));
        assert!(store.load("algo101").unwrap().questions.is_empty());
    }
}

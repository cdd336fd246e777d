//! 会话控制器 - 编排层
//!
//! ## 职责
//!
//! 每次作答一个实例，是整个作答过程的"指挥中心"：
//!
//! 1. **启动**：读取持久化的已用时间，恢复总计时
//! 2. **导航**：委托 `QuestionNavigator` 计算前后题目，自己持有游标
//! 3. **作答**：所有写入都经过这里再落到 `AnswerStore`
//! 4. **语音题**：按需创建并复用 `VoiceResponse`
//! 5. **结束**：提交或放弃时释放所有节拍租约
//!
//! 表现层从不直接修改状态，只调用这里暴露的操作并读取 `SessionSnapshot`。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{AppResult, ConfigError, UsageError};
use crate::infrastructure::{AttemptEnding, ElapsedStore, Tick, TickSource, TimerId};
use crate::models::{Answer, AnswerSnapshot, AttemptId, Question, SectionOrdering, TestDefinition, VoiceState};
use crate::services::{
    AnswerStore, CaptureDevice, CountdownTimer, Position, QuestionNavigator, Submission,
    SubmissionOutcome, SubmitReason, Submitter, TimerEvent,
};
use crate::utils::logging::{format_clock, log_startup, truncate_text};
use crate::workflow::{AttemptCtx, VoiceResponse};

/// 会话状态
///
/// `Submitted` 和 `Abandoned` 是终态，进入后不再离开
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Submitted,
    Abandoned,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Submitted | SessionStatus::Abandoned)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::NotStarted => "NotStarted",
            SessionStatus::InProgress => "InProgress",
            SessionStatus::Submitted => "Submitted",
            SessionStatus::Abandoned => "Abandoned",
        };
        f.write_str(name)
    }
}

/// 导航结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// 移动到了新的题目
    Moved { index: usize },
    /// 已提交，作答结束
    Submitted,
    /// 离开作答，回到概览页（不提交）
    Left,
}

/// 表现层的临时输入状态，每次切题都从作答存储重置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DraftBuffer {
    pub free_text: String,
    pub selected_option: Option<String>,
}

impl DraftBuffer {
    fn from_answer(answer: &Answer) -> Self {
        Self {
            free_text: answer.free_text.clone().unwrap_or_default(),
            selected_option: answer.selected_option.clone(),
        }
    }
}

/// 会话快照，供表现层渲染
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub attempt_id: AttemptId,
    pub test_title: String,
    pub status: SessionStatus,
    pub position: Option<Position>,
    pub question: Option<Question>,
    pub draft: DraftBuffer,
    pub voice_state: Option<VoiceState>,
    pub remaining_seconds: u64,
    pub remaining_display: String,
    pub answered: usize,
    pub submission: Option<SubmissionOutcome>,
}

/// 会话依赖的外部协作方
pub struct SessionDeps {
    pub store: Arc<dyn ElapsedStore>,
    pub submitter: Box<dyn Submitter>,
    pub capture: Box<dyn CaptureDevice>,
    pub ticks: Arc<dyn TickSource>,
}

/// 会话控制器
pub struct SessionController {
    attempt_id: AttemptId,
    test_id: String,
    test_title: String,
    allow_revisit: bool,
    voice_prep_seconds: u64,
    catalog: HashMap<String, Question>,

    navigator: Option<QuestionNavigator>,
    cursor: usize,
    status: SessionStatus,
    answers: AnswerStore,
    voices: HashMap<String, VoiceResponse>,
    overall: CountdownTimer,
    draft: DraftBuffer,
    submit_reason: Option<SubmitReason>,
    submission_outcome: Option<SubmissionOutcome>,

    store: Arc<dyn ElapsedStore>,
    submitter: Box<dyn Submitter>,
    capture: Box<dyn CaptureDevice>,
    ticks: Arc<dyn TickSource>,
}

impl SessionController {
    /// 创建会话控制器
    pub fn new(
        attempt_id: AttemptId,
        definition: &TestDefinition,
        voice_prep_seconds: u64,
        deps: SessionDeps,
    ) -> Self {
        let overall = CountdownTimer::new(TimerId::Overall)
            .with_persistence(attempt_id.clone(), Arc::clone(&deps.store));

        Self {
            attempt_id,
            test_id: definition.id.clone(),
            test_title: definition.title.clone(),
            allow_revisit: definition.allow_revisit,
            voice_prep_seconds,
            catalog: definition.catalog(),
            navigator: None,
            cursor: 0,
            status: SessionStatus::NotStarted,
            answers: AnswerStore::new(),
            voices: HashMap::new(),
            overall,
            draft: DraftBuffer::default(),
            submit_reason: None,
            submission_outcome: None,
            store: deps.store,
            submitter: deps.submitter,
            capture: deps.capture,
            ticks: deps.ticks,
        }
    }

    /// 开始作答
    ///
    /// 读取一次持久化的已用时间，从 `总时长 - 已用时间` 恢复总计时。
    /// 已经提交或放弃的作答会被拒绝。
    pub fn begin(&mut self, ordering: SectionOrdering, total_budget_minutes: u32) -> AppResult<()> {
        if self.status != SessionStatus::NotStarted {
            return Err(UsageError::SessionNotActive {
                status: self.status.to_string(),
            }
            .into());
        }

        let total_seconds = u64::from(total_budget_minutes) * 60;
        if total_seconds == 0 {
            return Err(ConfigError::InvalidBudget { total_seconds }.into());
        }
        if let Some(unknown) = ordering.ids().iter().find(|id| !self.catalog.contains_key(*id)) {
            return Err(ConfigError::UnknownQuestion {
                id: unknown.clone(),
            }
            .into());
        }

        match self.store.ending(&self.attempt_id) {
            Ok(Some(ending)) => {
                warn!("🚫 [作答 {}] 作答已 {}，拒绝重新开始", self.attempt_id, ending);
                return Err(ConfigError::AttemptClosed {
                    attempt_id: self.attempt_id.to_string(),
                    ending: ending.to_string(),
                }
                .into());
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "⚠️ [作答 {}] 无法读取结束标记，按未结束处理: {}",
                    self.attempt_id, e
                );
            }
        }

        let elapsed = match self.store.get(&self.attempt_id) {
            Ok(elapsed) => elapsed,
            Err(e) => {
                warn!(
                    "⚠️ [作答 {}] 无法读取已用时间，从头计时: {}",
                    self.attempt_id, e
                );
                None
            }
        };
        let resume_from = elapsed.map(|e| total_seconds.saturating_sub(e));

        // 清掉上一次作答遗留的界面状态
        self.answers.clear();
        self.voices.clear();
        self.draft = DraftBuffer::default();

        log_startup(
            &self.test_title,
            self.attempt_id.as_str(),
            ordering.len(),
            total_budget_minutes,
        );
        if let Some(elapsed) = elapsed {
            info!(
                "♻️ [作答 {}] 恢复计时: 已用 {}",
                self.attempt_id,
                format_clock(elapsed)
            );
        }

        self.navigator = Some(QuestionNavigator::new(ordering));
        self.status = SessionStatus::InProgress;

        let started = self
            .overall
            .start(total_seconds, resume_from, self.ticks.as_ref())?;
        self.enter(0)?;

        if started == Some(TimerEvent::Expired) {
            self.on_timer_expired();
        }
        Ok(())
    }

    /// 跳转到指定题目
    pub fn go_to(&mut self, question_id: &str) -> AppResult<usize> {
        self.ensure_active()?;
        let target = self
            .navigator()?
            .index_of(question_id)
            .ok_or_else(|| UsageError::UnknownQuestion {
                id: question_id.to_string(),
            })?;

        if !self.allow_revisit && target < self.cursor {
            return Err(UsageError::RevisitForbidden {
                from: self.cursor + 1,
                to: target + 1,
            }
            .into());
        }

        if target == self.cursor {
            self.draft = DraftBuffer::from_answer(&self.answers.get(question_id));
            return Ok(target);
        }

        self.leave_current()?;
        self.enter(target)?;
        Ok(target)
    }

    /// 下一题；最后一题时提交
    pub fn advance(&mut self) -> AppResult<NavOutcome> {
        self.ensure_active()?;
        let next = self.navigator()?.next_id(self.cursor).map(str::to_owned);
        match next {
            Some(next) => {
                let index = self.go_to(&next)?;
                Ok(NavOutcome::Moved { index })
            }
            None => {
                self.submit(SubmitReason::Completed);
                Ok(NavOutcome::Submitted)
            }
        }
    }

    /// 上一题；第一题时离开作答（不提交）
    pub fn retreat(&mut self) -> AppResult<NavOutcome> {
        self.ensure_active()?;
        let previous = self.navigator()?.previous_id(self.cursor).map(str::to_owned);
        match previous {
            Some(previous) => {
                let index = self.go_to(&previous)?;
                Ok(NavOutcome::Moved { index })
            }
            None => {
                self.abandon();
                Ok(NavOutcome::Left)
            }
        }
    }

    /// 当前题选择选项
    pub fn select_option(&mut self, option: &str) -> AppResult<()> {
        self.ensure_active()?;
        let question_id = self.current_id()?;
        let question = self
            .catalog
            .get(&question_id)
            .ok_or_else(|| UsageError::UnknownQuestion {
                id: question_id.clone(),
            })?;

        self.answers.set_selected_option(question, option)?;
        self.draft.selected_option = Some(option.to_string());
        Ok(())
    }

    /// 当前题写入自由文本
    pub fn write_text(&mut self, text: &str) -> AppResult<()> {
        self.ensure_active()?;
        let question_id = self.current_id()?;

        self.answers.set_free_text(&question_id, text);
        self.draft.free_text = text.to_string();
        Ok(())
    }

    /// 同意录音授权，开始准备
    pub fn accept_consent(&mut self) -> AppResult<()> {
        self.with_voice(|voice, ticks| voice.accept(ticks))
    }

    /// 关闭录音授权弹窗
    pub fn dismiss_consent(&mut self) -> AppResult<()> {
        self.with_voice(|voice, _| Ok(voice.dismiss()?))
    }

    /// 重新打开录音授权弹窗
    pub fn request_consent(&mut self) -> AppResult<()> {
        self.with_voice(|voice, _| Ok(voice.request_consent()?))
    }

    /// 跳过剩余准备时间，立即录音
    pub fn begin_recording(&mut self) -> AppResult<()> {
        self.with_voice(|voice, _| Ok(voice.begin_now()?))
    }

    /// 停止录音
    pub fn stop_recording(&mut self) -> AppResult<()> {
        self.with_voice(|voice, _| Ok(voice.stop()?))
    }

    /// 处理一个节拍；返回是否有可见变化
    pub fn on_tick(&mut self, tick: Tick) -> bool {
        if self.status != SessionStatus::InProgress {
            return false;
        }

        match &tick.timer {
            TimerId::Overall => match self.overall.tick(tick.lease) {
                Some(TimerEvent::Tick { .. }) => true,
                Some(TimerEvent::Expired) => {
                    self.on_timer_expired();
                    true
                }
                None => false,
            },
            TimerId::VoicePrep(question_id) => {
                let Some(voice) = self.voices.get_mut(question_id) else {
                    return false;
                };
                let before = voice.state();
                let changed = voice.on_prep_tick(tick.lease);
                if changed {
                    self.record_voice(question_id, before);
                }
                changed
            }
        }
    }

    /// 总计时归零：立即以现有作答自动提交
    pub fn on_timer_expired(&mut self) {
        if self.status != SessionStatus::InProgress {
            return;
        }
        warn!("⏰ [作答 {}] 时间到，自动提交", self.attempt_id);
        self.submit(SubmitReason::TimeExpired);
    }

    /// 表现层被销毁：释放所有租约，状态保持不变以便刷新后恢复
    pub fn suspend(&mut self) {
        self.release_all();
        info!(
            "💤 [作答 {}] 会话挂起，状态 {}，剩余 {}",
            self.attempt_id,
            self.status,
            format_clock(self.overall.remaining_seconds())
        );
    }

    // ========== 查询 ==========

    pub fn attempt_id(&self) -> &AttemptId {
        &self.attempt_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn position(&self) -> Option<Position> {
        self.navigator.as_ref()?.position(self.cursor).ok()
    }

    pub fn current_question(&self) -> Option<&Question> {
        let navigator = self.navigator.as_ref()?;
        let id = navigator.current_question_id(self.cursor).ok()?;
        self.catalog.get(id)
    }

    pub fn answer(&self, question_id: &str) -> Answer {
        self.answers.get(question_id)
    }

    pub fn answers_snapshot(&self) -> AnswerSnapshot {
        self.answers.snapshot()
    }

    pub fn draft(&self) -> &DraftBuffer {
        &self.draft
    }

    pub fn voice_state(&self, question_id: &str) -> Option<VoiceState> {
        self.voices.get(question_id).map(VoiceResponse::state)
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.overall.remaining_seconds()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.overall.elapsed_seconds()
    }

    pub fn question_count(&self) -> usize {
        self.navigator.as_ref().map_or(0, QuestionNavigator::total)
    }

    pub fn submit_reason(&self) -> Option<SubmitReason> {
        self.submit_reason
    }

    pub fn submission_outcome(&self) -> Option<SubmissionOutcome> {
        self.submission_outcome
    }

    /// 是否还有节拍租约未释放
    pub fn has_live_timers(&self) -> bool {
        self.overall.is_running() || self.voices.values().any(VoiceResponse::prep_running)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let question = self.current_question().cloned();
        let voice_state = question
            .as_ref()
            .and_then(|q| self.voice_state(&q.id));
        let remaining_seconds = self.remaining_seconds();

        SessionSnapshot {
            attempt_id: self.attempt_id.clone(),
            test_title: self.test_title.clone(),
            status: self.status,
            position: self.position(),
            question,
            draft: self.draft.clone(),
            voice_state,
            remaining_seconds,
            remaining_display: format_clock(remaining_seconds),
            answered: self.answers.answered_count(),
            submission: self.submission_outcome,
        }
    }

    // ========== 内部流程 ==========

    fn ensure_active(&self) -> AppResult<()> {
        if self.status == SessionStatus::InProgress {
            Ok(())
        } else {
            Err(UsageError::SessionNotActive {
                status: self.status.to_string(),
            }
            .into())
        }
    }

    fn navigator(&self) -> AppResult<&QuestionNavigator> {
        self.navigator.as_ref().ok_or_else(|| {
            UsageError::SessionNotActive {
                status: self.status.to_string(),
            }
            .into()
        })
    }

    fn current_id(&self) -> AppResult<String> {
        Ok(self
            .navigator()?
            .current_question_id(self.cursor)?
            .to_string())
    }

    fn ctx(&self) -> AttemptCtx {
        let question_id = self.current_id().unwrap_or_default();
        AttemptCtx::new(self.attempt_id.clone(), self.cursor + 1, question_id)
    }

    /// 进入题目：创建空作答、重置草稿、按需创建语音状态机
    fn enter(&mut self, index: usize) -> AppResult<()> {
        let question_id = self.navigator()?.current_question_id(index)?.to_string();
        self.cursor = index;

        let answer = self.answers.ensure(&question_id).clone();
        self.draft = DraftBuffer::from_answer(&answer);

        let is_voice = self.catalog.get(&question_id).is_some_and(Question::is_voice);
        if is_voice {
            let prep_seconds = self.voice_prep_seconds;
            let voice = self
                .voices
                .entry(question_id.clone())
                .or_insert_with(|| VoiceResponse::new(question_id.clone(), prep_seconds));
            let before = voice.state();
            voice.on_enter();
            self.record_voice(&question_id, before);
        }

        if let (Some(question), Some(position)) = (self.catalog.get(&question_id), self.position()) {
            info!(
                "{} 📄 第 {} 题 [{}] {}",
                self.ctx(),
                position,
                question.modality,
                truncate_text(&question.title, 40)
            );
        }
        Ok(())
    }

    /// 离开当前题目
    fn leave_current(&mut self) -> AppResult<()> {
        let question_id = self.current_id()?;
        if let Some(voice) = self.voices.get_mut(&question_id) {
            let before = voice.state();
            voice.on_leave();
            self.record_voice(&question_id, before);
        }
        Ok(())
    }

    fn with_voice<F>(&mut self, action: F) -> AppResult<()>
    where
        F: FnOnce(&mut VoiceResponse, &dyn TickSource) -> AppResult<()>,
    {
        self.ensure_active()?;
        let question_id = self.current_id()?;
        let ticks = Arc::clone(&self.ticks);

        let voice = self
            .voices
            .get_mut(&question_id)
            .ok_or_else(|| UsageError::NotVoiceQuestion {
                id: question_id.clone(),
            })?;
        let before = voice.state();
        action(voice, ticks.as_ref())?;

        self.record_voice(&question_id, before);
        Ok(())
    }

    /// 把语音状态同步到作答存储；状态种类变化时通知采集设备
    fn record_voice(&mut self, question_id: &str, before: VoiceState) {
        let Some(after) = self.voice_state(question_id) else {
            return;
        };
        self.answers.set_voice_state(question_id, after);
        if before.name() != after.name() {
            self.capture.observe(question_id, &after);
        }
    }

    /// 停止总计时和所有准备倒计时
    fn release_all(&mut self) {
        self.overall.stop();

        let voice_ids: Vec<String> = self.voices.keys().cloned().collect();
        for question_id in voice_ids {
            if let Some(voice) = self.voices.get_mut(&question_id) {
                let before = voice.state();
                voice.on_leave();
                self.record_voice(&question_id, before);
            }
        }
    }

    /// 写入结束标记，之后同一作答不能再开始
    fn mark_ended(&self, ending: AttemptEnding) {
        if let Err(e) = self.store.close(&self.attempt_id, ending) {
            warn!(
                "⚠️ [作答 {}] 无法写入结束标记: {}",
                self.attempt_id, e
            );
        }
    }

    fn abandon(&mut self) {
        self.release_all();
        self.status = SessionStatus::Abandoned;
        self.mark_ended(AttemptEnding::Abandoned);
        info!("↩️ [作答 {}] 考生退出作答，未提交", self.attempt_id);
    }

    /// 提交：每次作答只调用一次提交方
    fn submit(&mut self, reason: SubmitReason) {
        self.release_all();
        self.status = SessionStatus::Submitted;
        self.submit_reason = Some(reason);
        self.mark_ended(AttemptEnding::Submitted);

        let submission = Submission {
            attempt_id: self.attempt_id.clone(),
            test_id: self.test_id.clone(),
            answers: self.answers.snapshot(),
            elapsed_seconds: self.overall.elapsed_seconds(),
            reason,
            submitted_at: chrono::Local::now(),
        };

        info!(
            "📤 [作答 {}] 提交作答: {} 道题有输入，已用 {}",
            self.attempt_id,
            submission.answers.len(),
            format_clock(submission.elapsed_seconds)
        );

        // 提交失败不回退状态，作答在考生看来已经结束
        let outcome = match self.submitter.submit(&submission) {
            Ok(()) => SubmissionOutcome::Saved,
            Err(e) => {
                error!("❌ [作答 {}] 提交失败: {}", self.attempt_id, e);
                SubmissionOutcome::MayNotHaveSaved
            }
        };
        self.submission_outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::{MemoryElapsedStore, VirtualClock};
    use crate::models::{Modality, Section};
    use crate::services::{MemorySubmitter, RecordingCapture};

    fn question(id: &str, modality: Modality) -> Question {
        Question {
            id: id.to_string(),
            title: format!("题目 {}", id),
            skill: "general".to_string(),
            modality,
            time_budget_minutes: 1,
            description: String::new(),
            options: (modality == Modality::MultipleChoice)
                .then(|| vec!["a".to_string(), "b".to_string()]),
        }
    }

    fn definition(questions: Vec<Question>, allow_revisit: bool) -> TestDefinition {
        TestDefinition {
            id: "t1".to_string(),
            title: "单元测试试卷".to_string(),
            budget_minutes: 1,
            allow_revisit,
            sections: vec![Section {
                title: "全部".to_string(),
                questions,
            }],
        }
    }

    struct Harness {
        controller: SessionController,
        clock: VirtualClock,
        submitter: MemorySubmitter,
        capture: RecordingCapture,
    }

    impl Harness {
        fn new(def: &TestDefinition, store: Arc<dyn ElapsedStore>) -> Self {
            let clock = VirtualClock::new();
            let submitter = MemorySubmitter::new();
            let capture = RecordingCapture::new();
            let controller = SessionController::new(
                AttemptId::new("unit"),
                def,
                45,
                SessionDeps {
                    store,
                    submitter: Box::new(submitter.clone()),
                    capture: Box::new(capture.clone()),
                    ticks: Arc::new(clock.clone()),
                },
            );
            Self {
                controller,
                clock,
                submitter,
                capture,
            }
        }

        fn run(&mut self, seconds: u64) {
            for _ in 0..seconds {
                for tick in self.clock.advance() {
                    self.controller.on_tick(tick);
                }
            }
        }
    }

    fn started(def: &TestDefinition) -> Harness {
        let mut h = Harness::new(def, Arc::new(MemoryElapsedStore::new()));
        h.controller
            .begin(def.ordering().unwrap(), def.budget_minutes)
            .unwrap();
        h
    }

    #[test]
    fn test_begin_enters_first_question() {
        let def = definition(
            vec![question("q1", Modality::ShortAnswer), question("q2", Modality::LongAnswer)],
            true,
        );
        let h = started(&def);
        assert_eq!(h.controller.status(), SessionStatus::InProgress);
        assert_eq!(h.controller.position(), Some(Position { index: 0, total: 2 }));
        assert_eq!(h.controller.remaining_seconds(), 60);
        assert_eq!(h.clock.live_leases(), 1);
    }

    #[test]
    fn test_begin_rejects_zero_budget_and_unknown_ids() {
        let def = definition(vec![question("q1", Modality::ShortAnswer)], true);

        let mut h = Harness::new(&def, Arc::new(MemoryElapsedStore::new()));
        let err = h.controller.begin(def.ordering().unwrap(), 0).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::InvalidBudget { .. })
        ));
        assert_eq!(h.controller.status(), SessionStatus::NotStarted);

        let ordering = SectionOrdering::new(vec!["q1".into(), "ghost".into()]).unwrap();
        let err = h.controller.begin(ordering, 1).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::UnknownQuestion { ref id }) if id == "ghost"
        ));
        assert_eq!(h.clock.live_leases(), 0);
    }

    #[test]
    fn test_begin_resumes_from_persisted_elapsed() {
        let def = definition(vec![question("q1", Modality::ShortAnswer)], true);
        let store = Arc::new(MemoryElapsedStore::with_value(&AttemptId::new("unit"), 20));
        let mut h = Harness::new(&def, store.clone());
        h.controller.begin(def.ordering().unwrap(), 1).unwrap();

        assert_eq!(h.controller.remaining_seconds(), 40);
        h.run(2);
        assert_eq!(store.get(&AttemptId::new("unit")).unwrap(), Some(22));
    }

    #[test]
    fn test_begin_with_budget_already_spent_submits() {
        let def = definition(vec![question("q1", Modality::ShortAnswer)], true);
        let store = Arc::new(MemoryElapsedStore::with_value(&AttemptId::new("unit"), 600));
        let mut h = Harness::new(&def, store);
        h.controller.begin(def.ordering().unwrap(), 1).unwrap();

        assert_eq!(h.controller.status(), SessionStatus::Submitted);
        assert_eq!(h.controller.submit_reason(), Some(SubmitReason::TimeExpired));
        assert_eq!(h.submitter.count(), 1);
        assert_eq!(h.clock.live_leases(), 0);
    }

    #[test]
    fn test_switching_questions_keeps_input() {
        let def = definition(
            vec![question("q1", Modality::MultipleChoice), question("q2", Modality::LongAnswer)],
            true,
        );
        let mut h = started(&def);

        h.controller.select_option("b").unwrap();
        h.controller.advance().unwrap();
        assert_eq!(h.controller.draft(), &DraftBuffer::default());
        h.controller.write_text("草稿").unwrap();

        h.controller.go_to("q1").unwrap();
        assert_eq!(h.controller.draft().selected_option.as_deref(), Some("b"));
        h.controller.go_to("q2").unwrap();
        assert_eq!(h.controller.draft().free_text, "草稿");
    }

    #[test]
    fn test_invalid_option_is_usage_error() {
        let def = definition(vec![question("q1", Modality::MultipleChoice)], true);
        let mut h = started(&def);
        let err = h.controller.select_option("z").unwrap_err();
        assert!(err.is_usage());
        assert_eq!(h.controller.answer("q1").selected_option, None);
    }

    #[test]
    fn test_one_way_policy_blocks_revisit() {
        let def = definition(
            vec![question("q1", Modality::ShortAnswer), question("q2", Modality::ShortAnswer)],
            false,
        );
        let mut h = started(&def);
        h.controller.advance().unwrap();

        let err = h.controller.retreat().unwrap_err();
        assert!(matches!(
            err,
            AppError::Usage(UsageError::RevisitForbidden { from: 2, to: 1 })
        ));
        assert!(h.controller.go_to("q1").is_err());
        assert_eq!(h.controller.position().unwrap().index, 1);
    }

    #[test]
    fn test_voice_question_lifecycle_is_reported_to_capture() {
        let def = definition(
            vec![question("q1", Modality::Voice), question("q2", Modality::ShortAnswer)],
            true,
        );
        let mut h = started(&def);
        assert_eq!(h.controller.voice_state("q1"), Some(VoiceState::AwaitingConsent));

        h.controller.accept_consent().unwrap();
        h.run(3);
        assert_eq!(
            h.controller.voice_state("q1"),
            Some(VoiceState::Preparing { remaining_seconds: 42 })
        );
        h.controller.begin_recording().unwrap();
        h.controller.stop_recording().unwrap();

        assert_eq!(
            h.capture.states_for("q1"),
            vec!["AwaitingConsent", "Preparing", "Recording", "Stopped"]
        );
        assert_eq!(
            h.controller.answer("q1").voice_state,
            Some(VoiceState::Stopped)
        );
    }

    #[test]
    fn test_voice_commands_on_text_question_fail() {
        let def = definition(vec![question("q1", Modality::ShortAnswer)], true);
        let mut h = started(&def);
        let err = h.controller.accept_consent().unwrap_err();
        assert!(matches!(
            err,
            AppError::Usage(UsageError::NotVoiceQuestion { .. })
        ));
    }

    #[test]
    fn test_dismissal_holds_until_question_is_left() {
        let def = definition(
            vec![question("q1", Modality::Voice), question("q2", Modality::ShortAnswer)],
            true,
        );
        let mut h = started(&def);
        h.controller.dismiss_consent().unwrap();

        // 停留在当前题目不会重新弹出授权提示
        assert_eq!(h.controller.go_to("q1").unwrap(), 0);
        assert_eq!(h.controller.voice_state("q1"), Some(VoiceState::NotStarted));

        h.controller.advance().unwrap();
        h.controller.retreat().unwrap();
        assert_eq!(
            h.controller.voice_state("q1"),
            Some(VoiceState::AwaitingConsent)
        );
    }

    #[test]
    fn test_leaving_voice_question_releases_prep_timer() {
        let def = definition(
            vec![question("q1", Modality::Voice), question("q2", Modality::ShortAnswer)],
            true,
        );
        let mut h = started(&def);
        h.controller.accept_consent().unwrap();
        assert_eq!(h.clock.live_leases(), 2);

        h.controller.advance().unwrap();
        assert_eq!(h.clock.live_leases(), 1);
        assert_eq!(h.controller.voice_state("q1"), Some(VoiceState::NotStarted));

        h.controller.retreat().unwrap();
        assert_eq!(h.controller.voice_state("q1"), Some(VoiceState::AwaitingConsent));
    }

    #[test]
    fn test_suspend_releases_leases_without_changing_status() {
        let def = definition(vec![question("q1", Modality::Voice)], true);
        let mut h = started(&def);
        h.controller.accept_consent().unwrap();

        h.controller.suspend();
        assert_eq!(h.clock.live_leases(), 0);
        assert!(!h.controller.has_live_timers());
        assert_eq!(h.controller.status(), SessionStatus::InProgress);
        assert_eq!(h.submitter.count(), 0);
    }

    #[test]
    fn test_submission_failure_keeps_submitted_status() {
        let def = definition(vec![question("q1", Modality::ShortAnswer)], true);
        let clock = VirtualClock::new();
        let rejecting = MemorySubmitter::rejecting("network down");
        let mut controller = SessionController::new(
            AttemptId::new("unit"),
            &def,
            45,
            SessionDeps {
                store: Arc::new(MemoryElapsedStore::new()),
                submitter: Box::new(rejecting.clone()),
                capture: Box::new(RecordingCapture::new()),
                ticks: Arc::new(clock.clone()),
            },
        );
        controller.begin(def.ordering().unwrap(), 1).unwrap();

        assert_eq!(controller.advance().unwrap(), NavOutcome::Submitted);
        assert_eq!(controller.status(), SessionStatus::Submitted);
        assert_eq!(
            controller.submission_outcome(),
            Some(SubmissionOutcome::MayNotHaveSaved)
        );
        assert_eq!(rejecting.count(), 1);

        // 终态之后的操作都被拒绝，也不会再次提交
        assert!(controller.advance().is_err());
        assert!(controller.retreat().is_err());
        assert_eq!(rejecting.count(), 1);
    }
}

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use api_types::{campaign::CampaignView, contact::ContactList, template::TemplateView};
use chrono_tz::Tz;
use client::{
    Api, CampaignWizard, FileSessionStore, Gateway, LaunchStatus, OnboardingStep,
    OnboardingWizard, RecordingNavigator, Route, Session, WizardError, WizardStep,
    api::{DEFAULT_CAMPAIGN_LIMIT, DEFAULT_TEMPLATE_LIMIT},
    onboarding::{INTEGRATIONS, ROLES, SCALES, USE_CASES},
    routes::{guard, landing_for},
    wizard::{AudienceChoice, LaunchOutcome, TemplateChoice, default_audiences, filter_by_name},
};
use crossterm::event::{self, Event, KeyEvent};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Onboarding,
    Campaigns,
    Wizard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
pub struct OnboardingState {
    pub wizard: OnboardingWizard,
    pub cursor: usize,
    pub message: Option<String>,
}

impl OnboardingState {
    fn resume(step: OnboardingStep) -> Self {
        Self {
            wizard: OnboardingWizard::resume(step),
            ..Self::default()
        }
    }

    /// Number of choices offered by the current step.
    fn option_count(&self) -> usize {
        match self.wizard.step() {
            OnboardingStep::Workspace => ROLES.len(),
            OnboardingStep::UseCase => USE_CASES.len(),
            OnboardingStep::Integrations => INTEGRATIONS.len(),
            OnboardingStep::Scale => SCALES.len(),
            OnboardingStep::Complete => 0,
        }
    }

    fn move_cursor(&mut self, forward: bool) {
        let count = self.option_count();
        if count == 0 {
            return;
        }
        self.cursor = if forward {
            (self.cursor + 1) % count
        } else {
            (self.cursor + count - 1) % count
        };

        // single-choice steps follow the cursor
        match self.wizard.step() {
            OnboardingStep::Workspace => self.wizard.user_role = Some(ROLES[self.cursor].to_string()),
            OnboardingStep::UseCase => {
                self.wizard.use_case = Some(USE_CASES[self.cursor].0.to_string())
            }
            OnboardingStep::Scale => self.wizard.scale = Some(SCALES[self.cursor].0.to_string()),
            OnboardingStep::Integrations | OnboardingStep::Complete => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct CampaignsState {
    pub items: Vec<CampaignView>,
    pub selected: usize,
    pub error: Option<String>,
}

impl CampaignsState {
    fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.items.len() - 1);
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailsField {
    #[default]
    Name,
    Subject,
}

#[derive(Debug, Default)]
pub struct WizardState {
    pub wizard: CampaignWizard,
    pub focus: DetailsField,
    pub query: String,
    pub selected: usize,
    /// The user searched or moved the highlight since entering the step.
    pub browsed: bool,
    pub audiences: Vec<ContactList>,
    pub templates: Vec<TemplateView>,
    pub message: Option<String>,
    pub redirect: Option<(Instant, Route)>,
}

/// What a key press on the wizard screen asks the app to do.
#[derive(Debug, PartialEq, Eq)]
enum WizardCommand {
    Stay,
    Abandon,
    Launch,
}

impl WizardState {
    pub fn visible_audiences(&self) -> Vec<&ContactList> {
        filter_by_name(&self.audiences, &self.query)
    }

    pub fn visible_templates(&self) -> Vec<&TemplateView> {
        filter_by_name(&self.templates, &self.query)
    }

    fn visible_len(&self) -> usize {
        match self.wizard.step() {
            WizardStep::Audience => self.visible_audiences().len(),
            WizardStep::Content => self.visible_templates().len(),
            WizardStep::Details | WizardStep::Review => 0,
        }
    }

    /// Clears the search and puts the highlight on the row already chosen
    /// for the current step, if any.
    fn enter_step(&mut self) {
        self.query.clear();
        self.browsed = false;
        let draft = self.wizard.draft();
        self.selected = match self.wizard.step() {
            WizardStep::Audience => draft.audience.as_ref().and_then(|chosen| {
                self.audiences
                    .iter()
                    .position(|list| list.id == chosen.list_id)
            }),
            WizardStep::Content => draft.template.as_ref().and_then(|chosen| {
                self.templates
                    .iter()
                    .position(|template| template.id == chosen.template_id)
            }),
            WizardStep::Details | WizardStep::Review => None,
        }
        .unwrap_or(0);
    }

    fn has_choice(&self) -> bool {
        let draft = self.wizard.draft();
        match self.wizard.step() {
            WizardStep::Audience => draft.audience.is_some(),
            WizardStep::Content => draft.template.is_some(),
            WizardStep::Details | WizardStep::Review => false,
        }
    }

    /// Picks the highlighted row of the Audience or Content step.
    fn select_highlighted(&mut self) -> std::result::Result<(), WizardError> {
        match self.wizard.step() {
            WizardStep::Audience => {
                let choice = self
                    .visible_audiences()
                    .get(self.selected)
                    .map(|list| AudienceChoice::from(*list));
                if let Some(choice) = choice {
                    self.wizard.select_audience(choice)?;
                }
            }
            WizardStep::Content => {
                let choice = self
                    .visible_templates()
                    .get(self.selected)
                    .map(|template| TemplateChoice::from(*template));
                if let Some(choice) = choice {
                    self.wizard.select_template(choice)?;
                }
            }
            WizardStep::Details | WizardStep::Review => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, action: AppAction) -> WizardCommand {
        if self.wizard.is_finished() {
            return WizardCommand::Stay;
        }
        let step = self.wizard.step();

        let result = match (step, action) {
            (WizardStep::Details, AppAction::Cancel) => return WizardCommand::Abandon,
            (_, AppAction::Cancel) => self.wizard.back().map(|_| self.enter_step()),
            (WizardStep::Details, AppAction::NextField | AppAction::PrevField) => {
                self.focus = match self.focus {
                    DetailsField::Name => DetailsField::Subject,
                    DetailsField::Subject => DetailsField::Name,
                };
                Ok(())
            }
            (WizardStep::Details, AppAction::Input(ch)) => edit_details(self, |value| {
                value.push(ch);
            }),
            (WizardStep::Details, AppAction::Backspace) => edit_details(self, |value| {
                value.pop();
            }),
            (WizardStep::Audience | WizardStep::Content, AppAction::Input(ch)) => {
                self.query.push(ch);
                self.selected = 0;
                self.browsed = true;
                Ok(())
            }
            (WizardStep::Audience | WizardStep::Content, AppAction::Backspace) => {
                self.query.pop();
                self.selected = 0;
                self.browsed = true;
                Ok(())
            }
            (WizardStep::Audience | WizardStep::Content, AppAction::Up) => {
                self.selected = self.selected.saturating_sub(1);
                self.browsed = true;
                Ok(())
            }
            (WizardStep::Audience | WizardStep::Content, AppAction::Down) => {
                let len = self.visible_len();
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
                self.browsed = true;
                Ok(())
            }
            (WizardStep::Review, AppAction::Submit) => return WizardCommand::Launch,
            (_, AppAction::Submit) => self.submit(),
            _ => Ok(()),
        };

        self.message = result.err().map(|err| err.to_string());
        WizardCommand::Stay
    }

    /// Enter on a step: an untouched list keeps the earlier choice, otherwise
    /// the highlighted row is chosen before moving on.
    fn submit(&mut self) -> std::result::Result<(), WizardError> {
        if self.browsed || !self.has_choice() {
            self.select_highlighted()?;
        }
        self.wizard.next()?;
        self.enter_step();
        Ok(())
    }

    fn schedule_redirect(&mut self, outcome: &LaunchOutcome, now: Instant) {
        self.redirect = Some((now + outcome.redirect_after, outcome.redirect));
    }

    /// Hands out the post-launch route once its delay has passed.
    fn take_due_redirect(&mut self, now: Instant) -> Option<Route> {
        match self.redirect {
            Some((at, route)) if now >= at => {
                self.redirect = None;
                Some(route)
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub login: LoginState,
    pub onboarding: OnboardingState,
    pub campaigns: CampaignsState,
    pub wizard: WizardState,
    pub session: Option<Session>,
    pub timezone: Tz,
    pub base_url: String,
}

pub struct App {
    config: AppConfig,
    api: Api,
    navigator: Arc<RecordingNavigator>,
    pub state: AppState,
    launch_requested: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let sessions = Arc::new(FileSessionStore::new(config.session_path.clone()));
        let navigator = Arc::new(RecordingNavigator::new());
        let gateway = Gateway::builder()
            .base_url(&config.base_url)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .sessions(sessions)
            .navigator(navigator.clone())
            .build()?;

        let state = AppState {
            screen: Screen::Login,
            login: LoginState {
                email: config.email.clone(),
                password: String::new(),
                focus: LoginField::Email,
                message: None,
            },
            onboarding: OnboardingState::default(),
            campaigns: CampaignsState::default(),
            wizard: WizardState::default(),
            session: None,
            timezone: parse_timezone(&config.timezone),
            base_url: config.base_url.clone(),
        };

        Ok(Self {
            config,
            api: Api::new(gateway),
            navigator,
            state,
            launch_requested: false,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.restore_session()?;
        let start = self
            .state
            .session
            .as_ref()
            .map(landing_for)
            .unwrap_or(Route::Login);
        self.navigate(start).await;

        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    fn restore_session(&mut self) -> Result<()> {
        if let Some(callback) = self.config.oauth_callback.clone() {
            match Session::from_oauth_callback(&callback) {
                Ok(session) => {
                    self.api.adopt_session(session)?;
                }
                Err(err) => {
                    tracing::warn!("social login failed: {err:?}");
                    self.state.login.message = Some(err.to_string());
                }
            }
        }
        self.state.session = self.api.session();
        Ok(())
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            if let Some(route) = self.navigator.take() {
                if route == Route::Login && self.state.screen != Screen::Login {
                    self.state.login.message = Some(SESSION_EXPIRED.to_string());
                }
                self.navigate(route).await;
            }
            if let Some(route) = self.state.wizard.take_due_redirect(Instant::now()) {
                self.navigate(route).await;
            }

            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)?
                && let Event::Key(key) = event::read()?
            {
                self.handle_key(key).await?;
            }

            if std::mem::take(&mut self.launch_requested) {
                self.launch(terminal).await;
            }
        }

        Ok(())
    }

    /// Applies the route guard and switches screen, loading what the new
    /// screen shows.
    async fn navigate(&mut self, route: Route) {
        self.state.session = self.api.session();
        let route = guard(route, self.state.session.as_ref()).unwrap_or(route);
        tracing::debug!(route = %route.path(), "navigating");

        match route {
            Route::Landing | Route::Login | Route::Signup | Route::ForgotPassword => {
                self.state.login.password.clear();
                self.state.login.focus = LoginField::Email;
                self.state.screen = Screen::Login;
            }
            Route::Onboarding(step) => {
                if self.state.screen != Screen::Onboarding {
                    self.state.onboarding = OnboardingState::resume(step);
                }
                self.state.screen = Screen::Onboarding;
            }
            Route::NewCampaign => {
                self.state.wizard = WizardState::default();
                self.state.screen = Screen::Wizard;
                self.load_wizard_catalogs().await;
            }
            Route::Dashboard
            | Route::Campaigns
            | Route::Contacts
            | Route::Templates
            | Route::Reports => {
                self.state.screen = Screen::Campaigns;
                self.load_campaigns().await;
            }
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let action = map_key(key);
        if action == AppAction::Quit {
            self.should_quit = true;
            return Ok(());
        }

        match self.state.screen {
            Screen::Login => self.handle_login_key(action).await,
            Screen::Onboarding => self.handle_onboarding_key(action).await,
            Screen::Campaigns => self.handle_campaigns_key(action).await?,
            Screen::Wizard => self.handle_wizard_key(action).await,
        }
        Ok(())
    }

    async fn handle_login_key(&mut self, action: AppAction) {
        match action {
            AppAction::NextField | AppAction::PrevField => {
                self.state.login.focus = match self.state.login.focus {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            AppAction::Submit => self.attempt_login().await,
            AppAction::Backspace => {
                self.login_field_mut().pop();
            }
            AppAction::Input(ch) => self.login_field_mut().push(ch),
            AppAction::Cancel => self.state.login.message = None,
            _ => {}
        }
    }

    fn login_field_mut(&mut self) -> &mut String {
        match self.state.login.focus {
            LoginField::Email => &mut self.state.login.email,
            LoginField::Password => &mut self.state.login.password,
        }
    }

    async fn attempt_login(&mut self) {
        let email = self.state.login.email.trim().to_string();
        let password = self.state.login.password.clone();
        if email.is_empty() || password.is_empty() {
            self.state.login.message = Some("Please enter your email and password.".to_string());
            return;
        }

        match self.api.login(&email, &password).await {
            Ok(session) => {
                self.state.login.message = None;
                self.navigate(landing_for(&session)).await;
            }
            Err(err) => {
                self.state.login.message = Some(err.user_message());
            }
        }
    }

    async fn handle_onboarding_key(&mut self, action: AppAction) {
        let onboarding = &mut self.state.onboarding;
        let step = onboarding.wizard.step();
        match action {
            AppAction::Cancel => {
                if onboarding.wizard.back().is_some() {
                    onboarding.cursor = 0;
                    onboarding.message = None;
                }
            }
            AppAction::Up => onboarding.move_cursor(false),
            AppAction::Down | AppAction::NextField => onboarding.move_cursor(true),
            AppAction::Input(' ') if step == OnboardingStep::Integrations => {
                let (value, _) = INTEGRATIONS[onboarding.cursor];
                onboarding.wizard.toggle_integration(value);
            }
            AppAction::Input(ch) if step == OnboardingStep::Workspace => {
                onboarding.wizard.workspace_name.push(ch);
            }
            AppAction::Backspace if step == OnboardingStep::Workspace => {
                onboarding.wizard.workspace_name.pop();
            }
            AppAction::Submit => self.submit_onboarding().await,
            _ => {}
        }
    }

    async fn submit_onboarding(&mut self) {
        let onboarding = &mut self.state.onboarding;
        onboarding.message = None;

        let result = if onboarding.wizard.step() == OnboardingStep::Complete {
            onboarding.wizard.complete(&self.api).await.map(|_| ())
        } else {
            match onboarding.wizard.submit(&self.api).await {
                Ok(OnboardingStep::Complete) => {
                    onboarding.cursor = 0;
                    onboarding.wizard.complete(&self.api).await.map(|_| ())
                }
                Ok(_) => {
                    onboarding.cursor = 0;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        };

        match result {
            Ok(()) if self.state.onboarding.wizard.is_completed() => {
                self.navigate(Route::Dashboard).await;
            }
            Ok(()) => {}
            Err(err) => {
                tracing::warn!("onboarding step failed: {err}");
                self.state.onboarding.message = Some(err.user_message());
            }
        }
    }

    async fn handle_campaigns_key(&mut self, action: AppAction) -> Result<()> {
        match action {
            AppAction::Up => self.state.campaigns.select_prev(),
            AppAction::Down => self.state.campaigns.select_next(),
            AppAction::Input('n') => self.navigate(Route::NewCampaign).await,
            AppAction::Input('r') => self.load_campaigns().await,
            AppAction::Input('l') => {
                self.api.logout()?;
                self.state.login.message = None;
                self.navigate(Route::Login).await;
            }
            AppAction::Input('q') => self.should_quit = true,
            _ => {}
        }
        Ok(())
    }

    async fn handle_wizard_key(&mut self, action: AppAction) {
        match self.state.wizard.handle_key(action) {
            WizardCommand::Stay => {}
            WizardCommand::Abandon => {
                tracing::debug!("campaign wizard abandoned");
                self.navigate(Route::Campaigns).await;
            }
            WizardCommand::Launch => self.launch_requested = true,
        }
    }

    async fn launch(&mut self, terminal: &mut ui::Terminal) {
        let name = self.state.wizard.wizard.draft().name.clone();
        let result = self
            .state
            .wizard
            .wizard
            .launch_observed(&self.api, |status| {
                if let Err(err) =
                    terminal.draw(|frame| ui::screens::wizard::render_progress(frame, &name, status))
                {
                    tracing::warn!("failed to draw launch progress: {err}");
                }
            })
            .await;

        match result {
            Ok(outcome) => {
                self.state.wizard.message = None;
                self.state.wizard.schedule_redirect(&outcome, Instant::now());
            }
            // the launch status carries the message shown to the user
            Err(WizardError::Launch(err)) => tracing::warn!("campaign launch failed: {err}"),
            Err(err) => self.state.wizard.message = Some(err.to_string()),
        }
    }

    async fn load_campaigns(&mut self) {
        match self.api.campaigns(None, DEFAULT_CAMPAIGN_LIMIT).await {
            Ok(items) => {
                self.state.campaigns.selected = self
                    .state
                    .campaigns
                    .selected
                    .min(items.len().saturating_sub(1));
                self.state.campaigns.items = items;
                self.state.campaigns.error = None;
            }
            Err(err) => {
                self.state.campaigns.error = Some(err.user_message());
            }
        }
    }

    async fn load_wizard_catalogs(&mut self) {
        self.state.wizard.audiences = match self.api.contact_lists().await {
            Ok(lists) if !lists.is_empty() => lists,
            Ok(_) => default_audiences(),
            Err(err) if err.is_not_found() => {
                tracing::debug!("backend has no contact lists endpoint, using built-in segments");
                default_audiences()
            }
            Err(err) => {
                self.state.wizard.message = Some(err.user_message());
                default_audiences()
            }
        };

        match self.api.templates(1, DEFAULT_TEMPLATE_LIMIT).await {
            Ok(page) => self.state.wizard.templates = page.data,
            Err(err) => {
                tracing::warn!("failed to load templates: {err}");
                self.state.wizard.message = Some(err.user_message());
            }
        }
    }
}

fn edit_details(
    state: &mut WizardState,
    edit: impl FnOnce(&mut String),
) -> std::result::Result<(), WizardError> {
    let draft = state.wizard.draft();
    let (mut name, mut subject) = (draft.name.clone(), draft.subject.clone());
    match state.focus {
        DetailsField::Name => edit(&mut name),
        DetailsField::Subject => edit(&mut subject),
    }
    state.wizard.set_details(name, subject)
}

fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(timezone = name, "unknown timezone, falling back to UTC");
        Tz::UTC
    })
}

/// Label for the launch button area on the Review step.
pub fn launch_label(status: &LaunchStatus) -> &'static str {
    status.label().unwrap_or("Launch Campaign")
}

//! `Helpdesk`: the service every surface talks to.
//!
//! Each method names the acting actor explicitly, resolves it against the
//! actor collection, and runs one load, check, mutate, save cycle on the
//! collection it touches. Nothing is written when a check fails.

use crate::access::{AccessPolicy, Action};
use crate::actor::{self, Actor, Registration};
use crate::article::{self, ArticleInput, KnowledgeArticle};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{HelpdeskError, Result};
use crate::kb_import::{self, ArticlePrefill};
use crate::message::Message;
use crate::paths;
use crate::report::{self, ReportFilter, ReportSchedule, ReportSummary, ScheduleInput};
use crate::sector;
use crate::store::{FileStore, MemoryStore, Store};
use crate::ticket::{self, NewTicket, Ticket};
use crate::triage::{TriageJob, TriageRequest, TriageVerdict};
use crate::types::Role;
use crate::view::{self, ArticleQuery, ArticleView, TicketQuery, TicketSummary, TicketView};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MASTER_ACTOR_NAME: &str = "Administrator";

/// Actors as the administration screen lists them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDirectory {
    pub active: Vec<Actor>,
    pub pending: Vec<Actor>,
}

/// Files written by [`init`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Create `.helpdesk/` under `root` with config, master admin, default
/// sectors and report schedule. Existing files are left alone.
pub fn init(root: &Path, organization: &str) -> Result<InitReport> {
    let mut report = InitReport::default();
    let mut note = |path: &str, created: bool| {
        if created {
            report.created.push(path.to_string());
        } else {
            report.existing.push(path.to_string());
        }
    };

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        note(paths::CONFIG_FILE, false);
        Config::load(root)?
    } else {
        let config = Config::new(organization);
        config.save(root)?;
        note(paths::CONFIG_FILE, true);
        config
    };

    let store = FileStore::at(root);
    let master = Actor::seeded(&config.master_actor_id, MASTER_ACTOR_NAME, Role::Admin);
    note(
        paths::ACTORS_FILE,
        store.seed(&paths::actors_path(root), &[master])?,
    );
    note(
        paths::SECTORS_FILE,
        store.seed(
            &paths::sectors_path(root),
            &sector::defaults(&config.manual_triage_sector),
        )?,
    );
    note(
        paths::TICKETS_FILE,
        store.seed::<Ticket>(&paths::tickets_path(root), &[])?,
    );
    note(
        paths::ARTICLES_FILE,
        store.seed::<KnowledgeArticle>(&paths::articles_path(root), &[])?,
    );
    note(
        paths::SCHEDULES_FILE,
        store.seed(&paths::schedules_path(root), &report::default_schedules())?,
    );
    tracing::info!(root = %root.display(), created = report.created.len(), "helpdesk initialized");
    Ok(report)
}

pub struct Helpdesk<S: Store> {
    store: S,
}

impl Helpdesk<FileStore> {
    pub fn open(root: &Path) -> Result<Self> {
        Ok(Self::new(FileStore::open(root)?))
    }
}

impl Helpdesk<MemoryStore> {
    /// An in-memory desk seeded the way [`init`] seeds a directory.
    pub fn in_memory(config: Config) -> Result<Self> {
        let master = Actor::seeded(&config.master_actor_id, MASTER_ACTOR_NAME, Role::Admin);
        let store = MemoryStore::with_config(config.clone());
        store.replace_actors(&[master])?;
        store.replace_sectors(&sector::defaults(&config.manual_triage_sector))?;
        store.replace_schedules(&report::default_schedules())?;
        Ok(Self::new(store))
    }
}

impl<S: Store> Helpdesk<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> Result<Config> {
        self.store.config()
    }

    fn policy(&self) -> Result<AccessPolicy> {
        Ok(AccessPolicy::new(self.config()?.master_actor_id))
    }

    /// Resolve the acting actor. An unknown ID is refused like any other
    /// unauthorized caller.
    fn acting(actors: &[Actor], actor_id: &str) -> Result<Actor> {
        actor::find(actors, actor_id).cloned().map_err(|_| {
            HelpdeskError::Unauthorized {
                actor: actor_id.to_string(),
                action: "use this helpdesk".to_string(),
            }
        })
    }

    fn actor(&self, actor_id: &str) -> Result<Actor> {
        Self::acting(&self.store.actors()?, actor_id)
    }

    pub fn whoami(&self, actor_id: &str) -> Result<Actor> {
        self.actor(actor_id)
    }

    // -----------------------------------------------------------------------
    // Actors
    // -----------------------------------------------------------------------

    /// Self-registration. Needs no acting actor; the result is a pending
    /// requester.
    pub fn register(&self, registration: Registration) -> Result<Actor> {
        let config = self.config()?;
        let mut actors = self.store.actors()?;
        let created = actor::register(&mut actors, registration, config.allowed_domain())?;
        self.store.replace_actors(&actors)?;
        tracing::info!(actor = %created.id, "registration received");
        Ok(created)
    }

    pub fn actors(&self, actor_id: &str) -> Result<ActorDirectory> {
        let policy = self.policy()?;
        let actors = self.store.actors()?;
        let me = Self::acting(&actors, actor_id)?;
        policy.authorize(&me, Action::ReviewRegistration)?;
        let (active, pending) = actor::partition(&actors);
        Ok(ActorDirectory {
            active: active.into_iter().cloned().collect(),
            pending: pending.into_iter().cloned().collect(),
        })
    }

    fn mutate_actors<T>(
        &self,
        actor_id: &str,
        f: impl FnOnce(&mut Vec<Actor>, &AccessPolicy, &Actor) -> Result<T>,
    ) -> Result<T> {
        let policy = self.policy()?;
        let mut actors = self.store.actors()?;
        let me = Self::acting(&actors, actor_id)?;
        let out = f(&mut actors, &policy, &me)?;
        self.store.replace_actors(&actors)?;
        Ok(out)
    }

    pub fn approve_registration(&self, actor_id: &str, target_id: &str, role: Role) -> Result<Actor> {
        self.mutate_actors(actor_id, |actors, policy, me| {
            actor::approve_registration(actors, policy, me, target_id, role)
        })
    }

    pub fn reject_registration(&self, actor_id: &str, target_id: &str, confirmed: bool) -> Result<Actor> {
        self.mutate_actors(actor_id, |actors, policy, me| {
            actor::reject_registration(actors, policy, me, target_id, confirmed)
        })
    }

    pub fn change_role(&self, actor_id: &str, target_id: &str, role: Role) -> Result<Actor> {
        self.mutate_actors(actor_id, |actors, policy, me| {
            actor::change_role(actors, policy, me, target_id, role)
        })
    }

    pub fn set_home_sector(
        &self,
        actor_id: &str,
        target_id: &str,
        sector: Option<&str>,
    ) -> Result<Actor> {
        let registry = self.store.sectors()?;
        self.mutate_actors(actor_id, |actors, policy, me| {
            actor::set_home_sector(actors, policy, me, target_id, sector, &registry)
        })
    }

    pub fn remove_actor(&self, actor_id: &str, target_id: &str, confirmed: bool) -> Result<Actor> {
        self.mutate_actors(actor_id, |actors, policy, me| {
            actor::remove(actors, policy, me, target_id, confirmed)
        })
    }

    /// Restrict self-registration to one email domain, or lift the
    /// restriction with `None`.
    pub fn set_allowed_domain(&self, actor_id: &str, domain: Option<&str>) -> Result<Config> {
        let mut config = self.config()?;
        let policy = AccessPolicy::new(config.master_actor_id.clone());
        let me = self.actor(actor_id)?;
        policy.authorize(&me, Action::ManageRegistrationPolicy)?;
        let domain = domain
            .map(|d| d.trim().trim_start_matches('@').to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &domain {
            if d.contains('@') || !d.contains('.') {
                return Err(HelpdeskError::validation(format!("'{d}' is not a domain")));
            }
        }
        config.registration.allowed_domain = domain;
        self.store.replace_config(&config)?;
        tracing::info!(domain = ?config.registration.allowed_domain, by = %me.id, "registration domain changed");
        Ok(config)
    }

    // -----------------------------------------------------------------------
    // Tickets
    // -----------------------------------------------------------------------

    /// Open a ticket. Triage runs before anything is written and never
    /// fails; an unavailable classifier routes the ticket to manual triage.
    pub async fn create_ticket(
        &self,
        actor_id: &str,
        new: NewTicket,
        classifier: &dyn Classifier,
    ) -> Result<TicketView> {
        let job = self.prepare_ticket(actor_id, &new)?;
        let verdict = job.run(classifier).await;
        self.open_ticket(actor_id, new, verdict)
    }

    /// First half of [`Helpdesk::create_ticket`]: authorize, validate and
    /// assemble the triage request. Reads only.
    pub fn prepare_ticket(&self, actor_id: &str, new: &NewTicket) -> Result<TriageJob> {
        let config = self.config()?;
        let policy = AccessPolicy::new(config.master_actor_id.clone());
        let actors = self.store.actors()?;
        let me = Self::acting(&actors, actor_id)?;
        policy.authorize(&me, Action::CreateTicket)?;
        new.validate()?;

        let request = TriageRequest::build(
            new.title.trim(),
            new.description.trim(),
            &actors,
            &self.store.articles()?,
            &self.store.sectors()?,
        );
        Ok(TriageJob {
            request,
            manual_sector: config.manual_triage_sector,
        })
    }

    /// Second half of [`Helpdesk::create_ticket`]: store the ticket with
    /// its verdict. The actor is checked again since the classifier call
    /// may have taken a while.
    pub fn open_ticket(
        &self,
        actor_id: &str,
        new: NewTicket,
        verdict: TriageVerdict,
    ) -> Result<TicketView> {
        let config = self.config()?;
        let policy = AccessPolicy::new(config.master_actor_id.clone());
        let me = self.actor(actor_id)?;
        policy.authorize(&me, Action::CreateTicket)?;
        new.validate()?;

        let mut tickets = self.store.tickets()?;
        let created = Ticket::open(
            ticket::next_id(&tickets),
            &me,
            &new,
            verdict,
            &config.assistant_name,
        );
        tickets.push(created.clone());
        self.store.replace_tickets(&tickets)?;
        tracing::info!(ticket = %created.id, sector = %created.sector, priority = %created.priority, "ticket created");
        TicketView::build(&policy, &me, &created)
    }

    pub fn tickets(&self, actor_id: &str, query: &TicketQuery) -> Result<Vec<TicketSummary>> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        view::queue(&policy, &me, &self.store.tickets()?, query)
    }

    pub fn ticket(&self, actor_id: &str, ticket_id: &str) -> Result<TicketView> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let tickets = self.store.tickets()?;
        TicketView::build(&policy, &me, ticket::find(&tickets, ticket_id)?)
    }

    fn mutate_ticket<T>(
        &self,
        actor_id: &str,
        ticket_id: &str,
        f: impl FnOnce(&mut Ticket, &AccessPolicy, &Actor) -> Result<T>,
    ) -> Result<(T, TicketView)> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut tickets = self.store.tickets()?;
        let t = ticket::find_mut(&mut tickets, ticket_id)?;
        let out = f(t, &policy, &me)?;
        let view = TicketView::build(&policy, &me, t)?;
        self.store.replace_tickets(&tickets)?;
        Ok((out, view))
    }

    pub fn send_message(
        &self,
        actor_id: &str,
        ticket_id: &str,
        content: &str,
        internal: bool,
    ) -> Result<Message> {
        self.mutate_ticket(actor_id, ticket_id, |t, policy, me| {
            t.send_message(policy, me, content, internal)
        })
        .map(|(m, _)| m)
    }

    pub fn resolve(&self, actor_id: &str, ticket_id: &str) -> Result<TicketView> {
        self.mutate_ticket(actor_id, ticket_id, |t, policy, me| t.resolve(policy, me))
            .map(|(_, v)| v)
    }

    pub fn close(&self, actor_id: &str, ticket_id: &str) -> Result<TicketView> {
        self.mutate_ticket(actor_id, ticket_id, |t, policy, me| t.close(policy, me))
            .map(|(_, v)| v)
    }

    pub fn reopen(&self, actor_id: &str, ticket_id: &str) -> Result<TicketView> {
        self.mutate_ticket(actor_id, ticket_id, |t, policy, me| t.reopen(policy, me))
            .map(|(_, v)| v)
    }

    pub fn assign_to_self(&self, actor_id: &str, ticket_id: &str) -> Result<TicketView> {
        self.mutate_ticket(actor_id, ticket_id, |t, policy, me| {
            t.assign_to_self(policy, me)
        })
        .map(|(_, v)| v)
    }

    pub fn rate(&self, actor_id: &str, ticket_id: &str, score: u8) -> Result<TicketView> {
        self.mutate_ticket(actor_id, ticket_id, |t, policy, me| {
            t.rate(policy, me, score)
        })
        .map(|(_, v)| v)
    }

    // -----------------------------------------------------------------------
    // Knowledge base
    // -----------------------------------------------------------------------

    pub fn articles(&self, actor_id: &str, query: &ArticleQuery) -> Result<Vec<ArticleView>> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        view::search_articles(&policy, &me, &self.store.articles()?, query)
    }

    pub fn article(&self, actor_id: &str, article_id: &str) -> Result<ArticleView> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let articles = self.store.articles()?;
        ArticleView::build(&policy, &me, article::find(&articles, article_id)?)
    }

    pub fn create_article(&self, actor_id: &str, input: ArticleInput) -> Result<ArticleView> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let sectors = self.store.sectors()?;
        let mut articles = self.store.articles()?;
        let created = KnowledgeArticle::create(article::next_id(&articles), &policy, &me, input, &sectors)?;
        articles.push(created.clone());
        self.store.replace_articles(&articles)?;
        tracing::info!(article = %created.id, approved = created.approved, "article created");
        ArticleView::build(&policy, &me, &created)
    }

    fn mutate_article(
        &self,
        actor_id: &str,
        article_id: &str,
        f: impl FnOnce(&mut KnowledgeArticle, &AccessPolicy, &Actor) -> Result<()>,
    ) -> Result<ArticleView> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut articles = self.store.articles()?;
        let a = article::find_mut(&mut articles, article_id)?;
        f(a, &policy, &me)?;
        let view = ArticleView::build(&policy, &me, a)?;
        self.store.replace_articles(&articles)?;
        Ok(view)
    }

    pub fn edit_article(&self, actor_id: &str, article_id: &str, input: ArticleInput) -> Result<ArticleView> {
        let sectors = self.store.sectors()?;
        self.mutate_article(actor_id, article_id, |a, policy, me| {
            a.edit(policy, me, input, &sectors)
        })
    }

    pub fn toggle_approval(&self, actor_id: &str, article_id: &str) -> Result<ArticleView> {
        self.mutate_article(actor_id, article_id, |a, policy, me| {
            a.toggle_approval(policy, me).map(|_| ())
        })
    }

    pub fn request_review(
        &self,
        actor_id: &str,
        article_id: &str,
        note: &str,
        proposed_content: Option<&str>,
    ) -> Result<ArticleView> {
        self.mutate_article(actor_id, article_id, |a, policy, me| {
            a.request_review(policy, me, note, proposed_content)
        })
    }

    pub fn validate_review(&self, actor_id: &str, article_id: &str) -> Result<ArticleView> {
        self.mutate_article(actor_id, article_id, |a, policy, me| {
            a.validate_review(policy, me)
        })
    }

    pub fn delete_article(&self, actor_id: &str, article_id: &str, confirmed: bool) -> Result<KnowledgeArticle> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut articles = self.store.articles()?;
        let removed = article::delete(&mut articles, &policy, &me, article_id, confirmed)?;
        self.store.replace_articles(&articles)?;
        Ok(removed)
    }

    /// Draft an article from a resolved ticket. Only a prefill comes back;
    /// nothing is stored until it is submitted through
    /// [`Helpdesk::create_article`].
    pub async fn import_ticket(
        &self,
        actor_id: &str,
        ticket_id: &str,
        classifier: &dyn Classifier,
    ) -> Result<ArticlePrefill> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        policy.authorize(&me, Action::CreateArticle)?;
        let tickets = self.store.tickets()?;
        let source = ticket::find(&tickets, ticket_id)?;
        kb_import::import(classifier, source).await
    }

    // -----------------------------------------------------------------------
    // Sectors
    // -----------------------------------------------------------------------

    pub fn sectors(&self) -> Result<Vec<String>> {
        self.store.sectors()
    }

    pub fn add_sector(&self, actor_id: &str, name: &str) -> Result<Vec<String>> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut sectors = self.store.sectors()?;
        if sector::add(&mut sectors, &policy, &me, name)? {
            self.store.replace_sectors(&sectors)?;
        }
        Ok(sectors)
    }

    pub fn remove_sector(&self, actor_id: &str, name: &str) -> Result<Vec<String>> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut sectors = self.store.sectors()?;
        if sector::remove(&mut sectors, &policy, &me, name)? {
            self.store.replace_sectors(&sectors)?;
        }
        Ok(sectors)
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    pub fn report(&self, actor_id: &str, filter: &ReportFilter) -> Result<ReportSummary> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        policy.authorize(&me, Action::ViewReports)?;
        Ok(report::summarize(&self.store.tickets()?, filter))
    }

    pub fn schedules(&self, actor_id: &str) -> Result<Vec<ReportSchedule>> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        policy.authorize(&me, Action::ManageReportSchedules)?;
        self.store.schedules()
    }

    pub fn save_schedule(&self, actor_id: &str, input: ScheduleInput) -> Result<ReportSchedule> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut schedules = self.store.schedules()?;
        let saved = report::save_schedule(&mut schedules, &policy, &me, input)?;
        self.store.replace_schedules(&schedules)?;
        Ok(saved)
    }

    pub fn toggle_schedule(&self, actor_id: &str, schedule_id: &str) -> Result<ReportSchedule> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut schedules = self.store.schedules()?;
        report::toggle_schedule(&mut schedules, &policy, &me, schedule_id)?;
        self.store.replace_schedules(&schedules)?;
        report::find(&schedules, schedule_id).cloned()
    }

    pub fn delete_schedule(&self, actor_id: &str, schedule_id: &str, confirmed: bool) -> Result<ReportSchedule> {
        let policy = self.policy()?;
        let me = self.actor(actor_id)?;
        let mut schedules = self.store.schedules()?;
        let removed = report::delete_schedule(&mut schedules, &policy, &me, schedule_id, confirmed)?;
        self.store.replace_schedules(&schedules)?;
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

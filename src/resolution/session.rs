//! The resolution state machine.
//!
//! # Overview
//!
//! A [`ResolutionSession`] walks the groups of a [`DupeReport`] one at a
//! time. Each group ends in exactly one [`GroupOutcome`]:
//!
//! - `KeptAll`: nothing touched (also the outcome of every group when not
//!   in keep-one mode, where groups are only listed)
//! - `Deleted`: every file, or every file but one, removed
//! - `Linked`: every file but one replaced by a link to the kept file
//! - `Stale`: fewer than two distinct listed files still exist, nothing to
//!   resolve
//!
//! Paths that reach a file already listed earlier in the group (`./a` next
//! to `a`, or the same file under a bind mount) are aliases, not copies.
//! They are dropped before prompting so the kept file is never removed or
//! linked through another name.
//!
//! A group is removed from the shared [`ResolutionState`] only after its
//! actions finished, so a snapshot taken at any time lists every group
//! that may still need work.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::choice::{Choice, ChoiceError};
use super::decider::{DecisionError, DecisionProvider};
use crate::actions::{delete_file, replace_with_symlink, DeleteMode};
use crate::duplicates::DupeReport;
use crate::scanner::FileId;

/// Shared "remaining" view of a report.
///
/// Cheap to clone; every clone sees the same state, so a shutdown hook can
/// snapshot it while a session is running.
#[derive(Debug, Clone, Default)]
pub struct ResolutionState {
    inner: Arc<Mutex<DupeReport>>,
}

impl ResolutionState {
    /// Wrap a report.
    #[must_use]
    pub fn new(report: DupeReport) -> Self {
        Self {
            inner: Arc::new(Mutex::new(report)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DupeReport> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current remaining groups and errors.
    #[must_use]
    pub fn snapshot(&self) -> DupeReport {
        self.lock().clone()
    }

    /// Mark a group resolved. Returns false if it was not present.
    pub fn remove(&self, checksum: &str) -> bool {
        self.lock().remove(checksum).is_some()
    }

    /// Number of groups left.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().group_count()
    }

    /// True when every group has been resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Final state of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Every file kept.
    KeptAll,
    /// Files deleted (or, in dry-run, would have been).
    Deleted,
    /// Files replaced by links (or, in dry-run, would have been).
    Linked,
    /// Fewer than two distinct files still exist.
    Stale,
}

/// One filesystem action taken, attempted, or described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRecord {
    /// File removed.
    Deleted(PathBuf),
    /// Dry-run: file would be removed.
    WouldDelete(PathBuf),
    /// Removal failed.
    DeleteFailed { path: PathBuf, error: String },
    /// File replaced by a link.
    Linked { path: PathBuf, target: PathBuf },
    /// Dry-run: file would be replaced by a link.
    WouldLink { path: PathBuf, target: PathBuf },
    /// Link replacement failed.
    LinkFailed { path: PathBuf, error: String },
}

impl ActionRecord {
    /// True for records of failed actions.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::DeleteFailed { .. } | Self::LinkFailed { .. })
    }
}

/// Everything that happened to one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResolution {
    /// The group's checksum.
    pub checksum: String,
    /// How the group ended.
    pub outcome: GroupOutcome,
    /// The choice applied, if one was asked for.
    pub choice: Option<Choice>,
    /// Listed paths that no longer existed.
    pub missing: Vec<PathBuf>,
    /// Listed paths that reach a file already listed earlier in the group.
    pub aliases: Vec<PathBuf>,
    /// Per-file actions, in order.
    pub actions: Vec<ActionRecord>,
}

/// Totals for a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Groups resolved in this run
    pub groups_resolved: usize,
    /// Groups kept unchanged
    pub kept_all: usize,
    /// Groups resolved by deletion
    pub deleted: usize,
    /// Groups resolved by linking
    pub linked: usize,
    /// Groups with fewer than two surviving files
    pub stale: usize,
    /// Files removed or, in dry-run, that would be
    pub files_deleted: usize,
    /// Files linked or, in dry-run, that would be
    pub files_linked: usize,
    /// Failed per-file actions
    pub failures: usize,
}

impl SessionSummary {
    fn record(&mut self, resolution: &GroupResolution) {
        self.groups_resolved += 1;
        match resolution.outcome {
            GroupOutcome::KeptAll => self.kept_all += 1,
            GroupOutcome::Deleted => self.deleted += 1,
            GroupOutcome::Linked => self.linked += 1,
            GroupOutcome::Stale => self.stale += 1,
        }
        for action in &resolution.actions {
            match action {
                ActionRecord::Deleted(_) | ActionRecord::WouldDelete(_) => self.files_deleted += 1,
                ActionRecord::Linked { .. } | ActionRecord::WouldLink { .. } => {
                    self.files_linked += 1;
                }
                ActionRecord::DeleteFailed { .. } | ActionRecord::LinkFailed { .. } => {
                    self.failures += 1;
                }
            }
        }
    }
}

/// Receives progress of a session for display.
pub trait SessionObserver {
    /// A group is about to be resolved; `items_left` counts it too.
    fn on_group(&mut self, _items_left: usize, _checksum: &str, _files: &[PathBuf]) {}

    /// A listed file no longer exists and was dropped from its group.
    fn on_missing(&mut self, _path: &Path) {}

    /// A listed path reaches the same file as `original` and was dropped.
    fn on_alias(&mut self, _path: &Path, _original: &Path) {}

    /// A per-file action completed, failed, or was described.
    fn on_action(&mut self, _action: &ActionRecord) {}
}

impl SessionObserver for () {}

/// Options for a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Ask for a choice per group instead of only listing groups.
    pub keep_one: bool,
    /// Describe destructive actions instead of performing them.
    pub dry_run: bool,
    /// How files are removed.
    pub delete_mode: DeleteMode,
}

/// Drives resolution of every group in a [`ResolutionState`].
#[derive(Debug)]
pub struct ResolutionSession {
    options: SessionOptions,
    state: ResolutionState,
}

impl ResolutionSession {
    /// Create a session over `state`.
    #[must_use]
    pub fn new(state: ResolutionState, options: SessionOptions) -> Self {
        Self { options, state }
    }

    /// The shared remaining state.
    #[must_use]
    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Resolve every remaining group, in checksum order.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if the decision provider fails. The group
    /// being decided and all later groups stay in the remaining state.
    pub fn run<D: DecisionProvider + ?Sized>(
        &self,
        decider: &mut D,
        observer: &mut dyn SessionObserver,
    ) -> Result<SessionSummary, DecisionError> {
        let groups = self.state.snapshot().dupes;
        let total = groups.len();
        let mut summary = SessionSummary::default();

        log::info!(
            "Resolving {} duplicate groups ({}{})",
            total,
            if self.options.keep_one { "keep-one" } else { "list" },
            if self.options.dry_run { ", dry-run" } else { "" }
        );

        for (index, (checksum, files)) in groups.into_iter().enumerate() {
            observer.on_group(total - index, &checksum, &files);
            let resolution = self.resolve_group(&checksum, files, decider, observer)?;
            self.state.remove(&checksum);
            log::debug!("Group {} resolved: {:?}", checksum, resolution.outcome);
            summary.record(&resolution);
        }

        Ok(summary)
    }

    /// Resolve a single group. Does not touch the remaining state.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if the decision provider fails.
    pub fn resolve_group<D: DecisionProvider + ?Sized>(
        &self,
        checksum: &str,
        files: Vec<PathBuf>,
        decider: &mut D,
        observer: &mut dyn SessionObserver,
    ) -> Result<GroupResolution, DecisionError> {
        let (files, missing): (Vec<PathBuf>, Vec<PathBuf>) = files
            .into_iter()
            .partition(|p| std::fs::symlink_metadata(p).is_ok());
        for path in &missing {
            log::warn!("File no longer exists: {}", path.display());
            observer.on_missing(path);
        }

        let (files, aliases) = split_aliases(files);
        for (path, original) in &aliases {
            log::warn!(
                "{} is the same file as {}",
                path.display(),
                original.display()
            );
            observer.on_alias(path, original);
        }

        let mut resolution = GroupResolution {
            checksum: checksum.to_string(),
            outcome: GroupOutcome::KeptAll,
            choice: None,
            missing,
            aliases: aliases.into_iter().map(|(path, _)| path).collect(),
            actions: Vec::new(),
        };

        if files.len() < 2 {
            resolution.outcome = GroupOutcome::Stale;
            return Ok(resolution);
        }

        if !self.options.keep_one {
            return Ok(resolution);
        }

        let choice = loop {
            let choice = decider.decide(checksum, &files)?;
            match validate(choice, &files) {
                Ok(choice) => break choice,
                Err(reason) => {
                    log::debug!("{}", reason);
                    decider.reject(&reason);
                }
            }
        };
        resolution.choice = Some(choice);

        let kept = choice.kept_index();
        // Build the list of files to act on without the kept one
        let others: Vec<&PathBuf> = files
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != kept)
            .map(|(_, p)| p)
            .collect();

        match choice {
            Choice::KeepAll => {}
            Choice::DeleteAll | Choice::Keep(_) => {
                resolution.outcome = GroupOutcome::Deleted;
                for path in others {
                    let record = self.delete(path);
                    observer.on_action(&record);
                    resolution.actions.push(record);
                }
            }
            Choice::Symlink(_) => {
                resolution.outcome = GroupOutcome::Linked;
                let target = kept
                    .and_then(|i| files.get(i))
                    .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
                    .unwrap_or_default();
                for path in others {
                    let record = self.link(path, &target);
                    observer.on_action(&record);
                    resolution.actions.push(record);
                }
            }
        }

        Ok(resolution)
    }

    fn delete(&self, path: &Path) -> ActionRecord {
        if self.options.dry_run {
            return ActionRecord::WouldDelete(path.to_path_buf());
        }
        match delete_file(path, self.options.delete_mode) {
            Ok(_) => ActionRecord::Deleted(path.to_path_buf()),
            Err(e) => ActionRecord::DeleteFailed {
                path: path.to_path_buf(),
                error: e.to_string(),
            },
        }
    }

    fn link(&self, path: &Path, target: &Path) -> ActionRecord {
        if self.options.dry_run {
            return ActionRecord::WouldLink {
                path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
                target: target.to_path_buf(),
            };
        }
        match replace_with_symlink(path, target) {
            Ok(linked) => ActionRecord::Linked {
                path: linked.path,
                target: linked.target,
            },
            Err(e) => ActionRecord::LinkFailed {
                path: path.to_path_buf(),
                error: e.to_string(),
            },
        }
    }
}

/// Keep the first path of each distinct file. Later paths reaching the
/// same file are returned with the path they alias.
fn split_aliases(files: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<(PathBuf, PathBuf)>) {
    let mut seen: HashMap<FileId, usize> = HashMap::new();
    let mut distinct: Vec<PathBuf> = Vec::with_capacity(files.len());
    let mut aliases = Vec::new();

    for path in files {
        let Ok(id) = FileId::of(&path) else {
            distinct.push(path);
            continue;
        };
        if let Some(&index) = seen.get(&id) {
            aliases.push((path, distinct[index].clone()));
        } else {
            seen.insert(id, distinct.len());
            distinct.push(path);
        }
    }

    (distinct, aliases)
}

/// Check the index and that the file to keep is still a regular file.
fn validate(choice: Choice, files: &[PathBuf]) -> Result<Choice, ChoiceError> {
    let choice = choice.check_range(files.len())?;
    if let Some(kept) = choice.kept_index().and_then(|i| files.get(i)) {
        let is_file = std::fs::symlink_metadata(kept)
            .map(|m| m.file_type().is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ChoiceError::KeptFileMissing(kept.clone()));
        }
    }
    Ok(choice)
}

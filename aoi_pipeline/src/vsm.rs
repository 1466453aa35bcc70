//! Hierarchical, command-driven state machine
//!
//! States form a single active chain from the root down to a leaf. Nodes live
//! in an arena and refer to their parent and active child by [`StateId`].
//! A node is built and entered on every transition and discarded together
//! with its subtree as soon as its parent moves elsewhere.

use crate::command::{Action, Command, CommandTable, Operation};
use crate::display::PointerEvent;
use crate::error::{Result, SessionError};
use crate::session::Session;
use crate::states;
use crate::types::{AoiDraft, MarkerId};
use image::RgbImage;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Root,
    Initial,
    Paused,
    DefineAoi,
    AoiName,
    AoiMarkerSelection,
    AoiDraw,
    Exiting,
}

impl StateKind {
    pub fn name(&self) -> &'static str {
        match self {
            StateKind::Root => "Root",
            StateKind::Initial => "Initial",
            StateKind::Paused => "Paused",
            StateKind::DefineAoi => "DefineAoi",
            StateKind::AoiName => "AoiName",
            StateKind::AoiMarkerSelection => "AoiMarkerSelection",
            StateKind::AoiDraw => "AoiDraw",
            StateKind::Exiting => "Exiting",
        }
    }

    /// Kind of the node that hosts this state as its child
    pub fn host(&self) -> Option<StateKind> {
        match self {
            StateKind::Root => None,
            StateKind::Initial | StateKind::Paused | StateKind::DefineAoi | StateKind::Exiting => {
                Some(StateKind::Root)
            }
            StateKind::AoiName | StateKind::AoiMarkerSelection | StateKind::AoiDraw => {
                Some(StateKind::DefineAoi)
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StateKind::Exiting)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle of a node in the state arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

/// What a state sees while it is entered, run or handed an event
pub struct StateContext<'a> {
    origin: Option<StateKind>,
    commands: CommandTable,
    capture_clicks: bool,
    delegate: Option<StateKind>,
    draft: Option<&'a mut AoiDraft>,
    // keys reachable on the active path while a hook runs
    command_keys: Vec<String>,
    forwarded: Option<String>,
    pub session: &'a mut Session,
}

impl<'a> StateContext<'a> {
    fn new(
        origin: Option<StateKind>,
        draft: Option<&'a mut AoiDraft>,
        session: &'a mut Session,
    ) -> Self {
        Self {
            origin,
            commands: CommandTable::new(),
            capture_clicks: false,
            delegate: None,
            draft,
            command_keys: Vec::new(),
            forwarded: None,
            session,
        }
    }

    /// The parent's active child at the time of the transition
    pub fn origin(&self) -> Option<StateKind> {
        self.origin
    }

    /// Reject the transition unless the origin is one of `allowed`
    pub fn accept_origins(&self, target: StateKind, allowed: &[Option<StateKind>]) -> Result<()> {
        if allowed.contains(&self.origin) {
            Ok(())
        } else {
            Err(SessionError::invalid_transition(self.origin, target))
        }
    }

    pub fn register(&mut self, key: &str, description: &str, action: Action) {
        self.commands.register(key, description, action);
    }

    /// The cancel command every non-initial state carries
    pub fn register_cancel(&mut self) {
        self.register(
            "c",
            "Cancel and return to the previous state.",
            Action::Invoke(Operation::Cancel),
        );
    }

    /// Route pointer events to this state until another state claims them
    pub fn capture_clicks(&mut self) {
        self.capture_clicks = true;
    }

    /// Enter `kind` as this state's child right after this state is installed
    pub fn delegate(&mut self, kind: StateKind) {
        self.delegate = Some(kind);
    }

    /// Whether `token` is a command reachable from the active path
    pub fn is_command(&self, token: &str) -> bool {
        let key = token.trim().to_lowercase();
        self.command_keys.iter().any(|k| *k == key)
    }

    /// Hand a token read inside a hook back to the tree for dispatch
    pub fn forward(&mut self, token: &str) {
        self.forwarded = Some(token.trim().to_lowercase());
    }

    /// Draft of the AOI being defined by the nearest enclosing workflow
    pub fn draft(&mut self) -> Result<&mut AoiDraft> {
        self.draft
            .as_deref_mut()
            .ok_or_else(|| SessionError::fatal("no AOI draft on the active path"))
    }
}

pub trait WorkflowState: Send {
    fn kind(&self) -> StateKind;

    /// Validate the origin, reset local data and register commands
    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()>;

    /// Per-tick hook; may request a transition
    fn run(&mut self, _ctx: &mut StateContext<'_>) -> Result<Option<StateKind>> {
        Ok(None)
    }

    /// Execute an operation registered by this state; may request a transition
    fn invoke(
        &mut self,
        op: Operation,
        _ctx: &mut StateContext<'_>,
    ) -> Result<Option<StateKind>> {
        log::debug!("{} has no handler for {:?}", self.kind(), op);
        Ok(None)
    }

    fn on_pointer(&mut self, _event: PointerEvent, _ctx: &mut StateContext<'_>) -> Result<()> {
        Ok(())
    }

    fn help_text(&self) -> &str {
        ""
    }

    /// Playback stays frozen while a state returning true is on the active path
    fn pauses_playback(&self) -> bool {
        false
    }

    fn draw_overlay(&self, _canvas: &mut RgbImage) {}

    fn draft(&self) -> Option<&AoiDraft> {
        None
    }

    fn draft_mut(&mut self) -> Option<&mut AoiDraft> {
        None
    }

    /// Markers currently picked by the operator, if this state tracks any
    fn selection(&self) -> Option<&BTreeSet<MarkerId>> {
        None
    }
}

struct Node {
    kind: StateKind,
    parent: Option<StateId>,
    child: Option<StateId>,
    /// Kind of the child that was active before the current one
    previous_child: Option<StateKind>,
    // None only while the state is borrowed out for a call
    state: Option<Box<dyn WorkflowState>>,
    commands: CommandTable,
}

fn nearest_draft(nodes: &mut [Option<Node>], start: Option<StateId>) -> Option<&mut AoiDraft> {
    let mut cursor = start;
    let mut found = None;
    while let Some(id) = cursor {
        let node = nodes.get(id.0)?.as_ref()?;
        if node.state.as_ref().is_some_and(|s| s.draft().is_some()) {
            found = Some(id);
            break;
        }
        cursor = node.parent;
    }
    nodes.get_mut(found?.0)?.as_mut()?.state.as_mut()?.draft_mut()
}

pub struct StateTree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: StateId,
    click_slot: Option<StateId>,
    entries: u64,
}

impl StateTree {
    /// Build and enter the root state
    pub fn new(session: &mut Session) -> Result<Self> {
        let mut state = states::create(StateKind::Root);
        let mut ctx = StateContext::new(None, None, session);
        state.enter(&mut ctx)?;
        let StateContext { commands, .. } = ctx;

        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: StateId(0),
            click_slot: None,
            entries: 0,
        };
        tree.root = tree.alloc(Node {
            kind: StateKind::Root,
            parent: None,
            child: None,
            previous_child: None,
            state: Some(state),
            commands,
        });
        Ok(tree)
    }

    fn alloc(&mut self, node: Node) -> StateId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                StateId(index)
            }
            None => {
                self.nodes.push(Some(node));
                StateId(self.nodes.len() - 1)
            }
        }
    }

    fn node(&self, id: StateId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| SessionError::fatal(format!("dangling state handle {:?}", id)))
    }

    fn node_mut(&mut self, id: StateId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| SessionError::fatal(format!("dangling state handle {:?}", id)))
    }

    fn release_subtree(&mut self, id: StateId) {
        let mut next = Some(id);
        while let Some(current) = next {
            let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) else {
                break;
            };
            if self.click_slot == Some(current) {
                self.click_slot = None;
            }
            self.free.push(current.0);
            next = node.child;
        }
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    /// Node ids from the root down to the active leaf
    pub fn active_path(&self) -> Vec<StateId> {
        let mut path = vec![self.root];
        let mut cursor = self.node(self.root).ok().and_then(|n| n.child);
        while let Some(id) = cursor {
            path.push(id);
            cursor = self.node(id).ok().and_then(|n| n.child);
        }
        path
    }

    pub fn leaf(&self) -> StateId {
        self.active_path().last().copied().unwrap_or(self.root)
    }

    pub fn kind_of(&self, id: StateId) -> Option<StateKind> {
        self.node(id).ok().map(|n| n.kind)
    }

    /// Kind of the active leaf
    pub fn current_kind(&self) -> StateKind {
        self.kind_of(self.leaf()).unwrap_or(StateKind::Root)
    }

    pub fn find_on_path(&self, kind: StateKind) -> Option<StateId> {
        self.active_path()
            .into_iter()
            .find(|&id| self.kind_of(id) == Some(kind))
    }

    pub fn state(&self, id: StateId) -> Option<&dyn WorkflowState> {
        self.nodes.get(id.0)?.as_ref()?.state.as_deref()
    }

    pub fn leaf_state(&self) -> Option<&dyn WorkflowState> {
        self.state(self.leaf())
    }

    /// Draft of the AOI workflow on the active path, if any
    pub fn draft(&self) -> Option<&AoiDraft> {
        self.active_path()
            .into_iter()
            .rev()
            .find_map(|id| self.state(id).and_then(|s| s.draft()))
    }

    /// Number of successful state entries so far
    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn click_slot(&self) -> Option<StateId> {
        self.click_slot
    }

    pub fn commands(&self, id: StateId) -> Option<&CommandTable> {
        self.node(id).ok().map(|n| &n.commands)
    }

    /// Find `key` in the leaf's table, then in each ancestor's
    pub fn lookup(&self, key: &str) -> Option<(StateId, Command)> {
        self.active_path().into_iter().rev().find_map(|id| {
            self.commands(id)
                .and_then(|table| table.get(key))
                .map(|command| (id, command.clone()))
        })
    }

    /// Every reachable command, leaf entries shadowing ancestors'
    pub fn available_commands(&self) -> Vec<Command> {
        let mut seen: Vec<Command> = Vec::new();
        for id in self.active_path().into_iter().rev() {
            if let Some(table) = self.commands(id) {
                for command in table.iter() {
                    if !seen.iter().any(|c| c.key == command.key) {
                        seen.push(command.clone());
                    }
                }
            }
        }
        seen
    }

    pub fn help(&self) -> String {
        let mut lines: Vec<String> = self
            .active_path()
            .into_iter()
            .filter_map(|id| self.state(id))
            .map(|s| s.help_text())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect();
        lines.extend(
            self.available_commands()
                .iter()
                .map(|c| format!("  {}: {}", c.key.to_uppercase(), c.description)),
        );
        lines.join("\n")
    }

    pub fn pauses_playback(&self) -> bool {
        self.active_path()
            .into_iter()
            .filter_map(|id| self.state(id))
            .any(|s| s.pauses_playback())
    }

    pub fn draw_overlays(&self, canvas: &mut RgbImage) {
        for id in self.active_path() {
            if let Some(state) = self.state(id) {
                state.draw_overlay(canvas);
            }
        }
    }

    /// Build `kind`, enter it with the parent's active child as origin and
    /// only then install it under `parent`. On rejection nothing changes.
    pub fn enter_state(
        &mut self,
        parent: StateId,
        kind: StateKind,
        session: &mut Session,
    ) -> Result<StateId> {
        self.install(parent, states::create(kind), session)
    }

    fn install(
        &mut self,
        parent: StateId,
        mut state: Box<dyn WorkflowState>,
        session: &mut Session,
    ) -> Result<StateId> {
        let kind = state.kind();
        let old_child = self.node(parent)?.child;
        let old_previous = self.node(parent)?.previous_child;
        let origin = match old_child {
            Some(child) => Some(self.node(child)?.kind),
            None => None,
        };

        let draft = nearest_draft(&mut self.nodes, Some(parent));
        let mut ctx = StateContext::new(origin, draft, session);
        let entered = state.enter(&mut ctx);
        let StateContext {
            commands,
            capture_clicks,
            delegate,
            ..
        } = ctx;
        entered?;

        // the old subtree stays allocated until the delegate accepts too
        let old_slot = self.click_slot;
        let id = self.alloc(Node {
            kind,
            parent: Some(parent),
            child: None,
            previous_child: None,
            state: Some(state),
            commands,
        });
        let host = self.node_mut(parent)?;
        host.child = Some(id);
        host.previous_child = origin;
        if capture_clicks {
            self.click_slot = Some(id);
        }

        if let Some(child) = delegate {
            if let Err(e) = self.enter_state(id, child, session) {
                self.release_subtree(id);
                let host = self.node_mut(parent)?;
                host.child = old_child;
                host.previous_child = old_previous;
                self.click_slot = old_slot;
                return Err(e);
            }
        }

        if let Some(old) = old_child {
            self.release_subtree(old);
        }
        self.entries += 1;
        log::info!("Entered state {}", kind);
        Ok(id)
    }

    /// Enter `kind` under whichever node on the active path hosts it
    pub fn transition(&mut self, kind: StateKind, session: &mut Session) -> Result<StateId> {
        let host_kind = kind
            .host()
            .ok_or_else(|| SessionError::fatal("the root state cannot be re-entered"))?;
        let host = self
            .find_on_path(host_kind)
            .ok_or_else(|| SessionError::invalid_transition(Some(self.current_kind()), kind))?;
        self.enter_state(host, kind, session)
    }

    // A rejected transition is reported and leaves the machine as it was
    fn request(&mut self, kind: StateKind, session: &mut Session) -> Result<()> {
        match self.transition(kind, session) {
            Ok(_) => Ok(()),
            Err(e) if e.is_invalid_transition() => {
                log::warn!("{}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Borrow the state of `id` out of its node for one hook call. Returns
    /// the hook's result and any token the hook forwarded for dispatch.
    fn with_state<R, F>(
        &mut self,
        id: StateId,
        session: &mut Session,
        f: F,
    ) -> Result<(R, Option<String>)>
    where
        F: FnOnce(&mut dyn WorkflowState, &mut StateContext<'_>) -> Result<R>,
    {
        let command_keys: Vec<String> = self
            .available_commands()
            .into_iter()
            .map(|c| c.key)
            .collect();
        let node = self.node_mut(id)?;
        let mut state = node
            .state
            .take()
            .ok_or_else(|| SessionError::fatal(format!("state {} is already in use", node.kind)))?;
        let parent = node.parent;

        let draft = nearest_draft(&mut self.nodes, parent);
        let mut ctx = StateContext::new(None, draft, session);
        ctx.command_keys = command_keys;
        let outcome = f(state.as_mut(), &mut ctx);
        let forwarded = ctx.forwarded.take();
        drop(ctx);

        if let Ok(node) = self.node_mut(id) {
            node.state = Some(state);
        }
        outcome.map(|value| (value, forwarded))
    }

    /// Look `token` up along the active path and execute its action.
    /// Unknown tokens are ignored; returns whether a command ran.
    pub fn dispatch(&mut self, token: &str, session: &mut Session) -> Result<bool> {
        let key = token.trim().to_lowercase();
        let Some((owner, command)) = self.lookup(&key) else {
            if !key.is_empty() {
                log::debug!("Ignoring unknown input '{}'", key);
            }
            return Ok(false);
        };

        log::debug!("'{}': {}", key, command.description);
        match command.action {
            Action::GoTo(kind) => self.request(kind, session)?,
            Action::Invoke(Operation::Cancel) => self.cancel(session)?,
            Action::Invoke(op) => {
                let (next, _) =
                    self.with_state(owner, session, |state, ctx| state.invoke(op, ctx))?;
                if let Some(kind) = next {
                    self.request(kind, session)?;
                }
            }
        }
        Ok(true)
    }

    /// Re-enter the previous child of the leaf's parent. Falls back to
    /// `Initial` at the root; failing that the machine is unusable.
    pub fn cancel(&mut self, session: &mut Session) -> Result<()> {
        let leaf = self.leaf();
        let previous = match self.node(leaf)?.parent {
            Some(parent) => self.node(parent)?.previous_child.map(|kind| (parent, kind)),
            None => None,
        };

        if let Some((host, kind)) = previous {
            match self.enter_state(host, kind, session) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_invalid_transition() => log::warn!("{}", e),
                Err(e) => return Err(e),
            }
        }

        log::info!("Returning to {}", StateKind::Initial);
        let root = self.root;
        self.enter_state(root, StateKind::Initial, session)
            .map_err(|e| SessionError::fatal(format!("cannot return to Initial: {}", e)))?;
        Ok(())
    }

    /// Run hooks from root to leaf; the first requested transition or
    /// forwarded command ends the pass
    pub fn run_active(&mut self, session: &mut Session) -> Result<()> {
        for id in self.active_path() {
            let (next, forwarded) = self.with_state(id, session, |state, ctx| state.run(ctx))?;
            if let Some(token) = forwarded {
                self.dispatch(&token, session)?;
                break;
            }
            if let Some(kind) = next {
                self.request(kind, session)?;
                break;
            }
        }
        Ok(())
    }

    /// Hand a pointer event to the state holding the click slot
    pub fn route_pointer(&mut self, event: PointerEvent, session: &mut Session) -> Result<bool> {
        let Some(id) = self.click_slot else {
            return Ok(false);
        };
        self.with_state(id, session, |state, ctx| state.on_pointer(event, ctx))?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::channel::FrameChannel;
    use crate::console::ScriptedCommandSource;
    use crate::sync_cell::MarkerSnapshot;
    use crate::types::Marker;

    pub(crate) fn session_with(lines: &[&str], markers: Vec<Marker>) -> Session {
        let snapshot = MarkerSnapshot::default();
        snapshot.set(markers);
        Session::new(
            snapshot,
            Box::new(ScriptedCommandSource::new(lines.iter().copied())),
            FrameChannel::new(2),
        )
    }

    fn started(session: &mut Session) -> StateTree {
        let mut tree = StateTree::new(session).unwrap();
        let root = tree.root();
        tree.enter_state(root, StateKind::Initial, session).unwrap();
        tree
    }

    fn kinds(tree: &StateTree) -> Vec<StateKind> {
        tree.active_path()
            .into_iter()
            .filter_map(|id| tree.kind_of(id))
            .collect()
    }

    #[test]
    fn test_rejected_enter_leaves_state_unchanged() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        let before = tree.leaf();

        let root = tree.root();
        let err = tree
            .enter_state(root, StateKind::AoiDraw, &mut session)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: Some(StateKind::Initial),
                to: StateKind::AoiDraw
            }
        ));
        assert_eq!(tree.leaf(), before);
        assert_eq!(tree.current_kind(), StateKind::Initial);
    }

    #[test]
    fn test_origin_allow_list() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        let root = tree.root();

        tree.enter_state(root, StateKind::Paused, &mut session).unwrap();
        // Paused only accepts Initial as origin
        assert!(tree
            .enter_state(root, StateKind::Paused, &mut session)
            .unwrap_err()
            .is_invalid_transition());
        assert_eq!(kinds(&tree), vec![StateKind::Root, StateKind::Paused]);

        // Exiting accepts anything
        tree.enter_state(root, StateKind::Exiting, &mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::Exiting);
    }

    #[test]
    fn test_commands_scoped_to_active_path() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);

        assert!(tree.lookup("n").is_none());
        assert!(tree.dispatch("p", &mut session).unwrap());
        assert_eq!(tree.current_kind(), StateKind::Paused);
        assert!(tree.lookup("n").is_some());

        tree.dispatch("p", &mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::Initial);
        assert!(tree.lookup("n").is_none());
        // quit lives on the root and is always reachable
        assert!(tree.lookup("q").is_some());
    }

    #[test]
    fn test_unknown_input_ignored() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        assert!(!tree.dispatch("zz", &mut session).unwrap());
        assert!(!tree.dispatch("", &mut session).unwrap());
        assert_eq!(tree.current_kind(), StateKind::Initial);
    }

    #[test]
    fn test_define_aoi_delegates_to_name() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("a", &mut session).unwrap();
        assert_eq!(
            kinds(&tree),
            vec![StateKind::Root, StateKind::DefineAoi, StateKind::AoiName]
        );
        assert!(tree.pauses_playback());
        assert!(tree.draft().is_some());
    }

    #[test]
    fn test_cancel_returns_to_previous() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("p", &mut session).unwrap();
        tree.dispatch("c", &mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::Initial);
    }

    #[test]
    fn test_cancel_falls_back_to_initial() {
        let mut session = session_with(&["desk"], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("a", &mut session).unwrap();
        tree.run_active(&mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::AoiMarkerSelection);

        // AoiName does not accept AoiMarkerSelection as origin
        tree.dispatch("c", &mut session).unwrap();
        assert_eq!(kinds(&tree), vec![StateKind::Root, StateKind::Initial]);
        assert!(tree.click_slot().is_none());
    }

    #[test]
    fn test_goto_without_host_is_ignored() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        assert!(tree
            .transition(StateKind::AoiName, &mut session)
            .unwrap_err()
            .is_invalid_transition());
        assert_eq!(tree.current_kind(), StateKind::Initial);
    }

    #[test]
    fn test_discarded_nodes_are_reused() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        for _ in 0..10 {
            tree.dispatch("p", &mut session).unwrap();
            tree.dispatch("p", &mut session).unwrap();
        }
        assert!(tree.nodes.len() <= 3);
    }

    #[test]
    fn test_help_lists_reachable_commands() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("p", &mut session).unwrap();
        let help = tree.help();
        assert!(help.contains("  N: "));
        assert!(help.contains("  Q: Quit."));
        assert!(!help.contains("  A: "));
    }

    #[test]
    fn test_command_typed_at_name_prompt_runs() {
        let mut session = session_with(&["q"], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("a", &mut session).unwrap();
        tree.run_active(&mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::Exiting);
        assert!(session.is_stopping());

        let mut session = session_with(&["C"], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("a", &mut session).unwrap();
        tree.run_active(&mut session).unwrap();
        assert_eq!(kinds(&tree), vec![StateKind::Root, StateKind::Initial]);
        assert!(tree.draft().is_none());
    }

    #[test]
    fn test_confirm_name_key() {
        let mut session = session_with(&["d"], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("a", &mut session).unwrap();

        // typed before any name was given: nothing to confirm yet
        tree.run_active(&mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::AoiName);
        assert_eq!(tree.draft().unwrap().name, "");

        let leaf = tree.leaf();
        nearest_draft(&mut tree.nodes, Some(leaf)).unwrap().name = "desk".to_string();
        tree.dispatch("d", &mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::AoiMarkerSelection);
        assert_eq!(tree.draft().unwrap().name, "desk");
    }

    fn drawing_desk(session: &mut Session) -> StateTree {
        let mut tree = started(session);
        tree.dispatch("a", session).unwrap();
        tree.run_active(session).unwrap();
        tree.route_pointer(PointerEvent::left(120, 120), session).unwrap();
        tree.dispatch("d", session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::AoiDraw);
        tree
    }

    fn click_all(tree: &mut StateTree, session: &mut Session, points: &[(i32, i32)]) {
        for &(x, y) in points {
            tree.route_pointer(PointerEvent::left(x, y), session).unwrap();
        }
    }

    #[test]
    fn test_draw_reset_and_minimum_points() {
        let mut session = session_with(&["desk"], vec![Marker::square(3, 100, 100, 50)]);
        let mut tree = drawing_desk(&mut session);

        click_all(&mut tree, &mut session, &[(0, 0), (50, 0)]);
        tree.dispatch("r", &mut session).unwrap();
        click_all(&mut tree, &mut session, &[(10, 10), (90, 10)]);

        // two points since the reset are not a boundary
        tree.dispatch("d", &mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::AoiDraw);
        assert!(session.aois().is_empty());

        click_all(&mut tree, &mut session, &[(90, 90)]);
        tree.dispatch("d", &mut session).unwrap();
        let aoi = session.aois().get("desk").unwrap();
        assert_eq!(aoi.boundary.len(), 3);
        assert_eq!(aoi.selected_marker_ids, BTreeSet::from([3]));
        assert_eq!(tree.current_kind(), StateKind::AoiName);
    }

    #[test]
    fn test_back_to_marker_selection_keeps_choice() {
        let mut session = session_with(&["desk"], vec![Marker::square(3, 100, 100, 50)]);
        let mut tree = drawing_desk(&mut session);

        tree.dispatch("m", &mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::AoiMarkerSelection);
        assert_eq!(
            tree.leaf_state().and_then(|s| s.selection()).cloned(),
            Some(BTreeSet::from([3]))
        );
        assert_eq!(tree.draft().unwrap().name, "desk");
    }

    /// Enters cleanly, then delegates to a child that rejects a missing origin
    struct DelegatesToPaused;

    impl WorkflowState for DelegatesToPaused {
        fn kind(&self) -> StateKind {
            StateKind::Initial
        }

        fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
            ctx.capture_clicks();
            ctx.delegate(StateKind::Paused);
            Ok(())
        }
    }

    #[test]
    fn test_rejected_delegate_rolls_back() {
        let mut session = session_with(&[], Vec::new());
        let mut tree = started(&mut session);
        tree.dispatch("p", &mut session).unwrap();
        let leaf = tree.leaf();
        let entries = tree.entries();
        let allocated = tree.nodes.iter().filter(|n| n.is_some()).count();

        let root = tree.root();
        let err = tree
            .install(root, Box::new(DelegatesToPaused), &mut session)
            .unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(kinds(&tree), vec![StateKind::Root, StateKind::Paused]);
        assert_eq!(tree.leaf(), leaf);
        assert_eq!(tree.entries(), entries);
        assert!(tree.click_slot().is_none());
        assert_eq!(tree.nodes.iter().filter(|n| n.is_some()).count(), allocated);

        // cancel still knows where Paused came from
        tree.dispatch("c", &mut session).unwrap();
        assert_eq!(tree.current_kind(), StateKind::Initial);
    }
}

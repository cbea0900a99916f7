//! Collaborator presence
//!
//! Derives what the builder canvas shows about other people: a cursor
//! marker per online collaborator and, on each node, a small cluster of
//! badges for whoever is currently editing it. Everything here is computed
//! from a `CollaborationContext` snapshot; nothing talks to the network.

use fd_core::FlowRecord;
use serde::{Deserialize, Serialize};

/// Badges shown on a node before collapsing into "+N"
pub const MAX_VISIBLE_BADGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: String,
    pub name: String,
    pub color: String,
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node: Option<String>,
}

/// Shared collaboration session, maintained elsewhere
pub trait CollaborationContext: Send + Sync {
    fn users(&self) -> Vec<Collaborator>;
    fn is_collaborative_mode(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorMarker {
    pub user_id: String,
    pub position: CursorPosition,
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub user_id: String,
    pub initials: String,
    pub color: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeCluster {
    pub node_id: String,
    pub visible: Vec<Badge>,
    /// Occupants beyond the visible badges
    pub overflow: usize,
    pub being_edited: bool,
}

impl BadgeCluster {
    pub fn occupant_count(&self) -> usize {
        self.visible.len() + self.overflow
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresenceOverlay {
    pub markers: Vec<CursorMarker>,
    pub clusters: Vec<BadgeCluster>,
}

/// Up to two uppercase initials from a display name
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();

    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

pub fn cursor_markers(ctx: &dyn CollaborationContext) -> Vec<CursorMarker> {
    if !ctx.is_collaborative_mode() {
        return Vec::new();
    }

    ctx.users()
        .into_iter()
        .filter(|user| user.is_online)
        .filter_map(|user| {
            user.cursor.map(|position| CursorMarker {
                user_id: user.id,
                position,
                color: user.color,
                label: user.name,
            })
        })
        .collect()
}

pub fn node_badges(ctx: &dyn CollaborationContext, node_id: &str) -> BadgeCluster {
    cluster_for(&ctx.users(), node_id)
}

fn cluster_for(users: &[Collaborator], node_id: &str) -> BadgeCluster {
    let occupants: Vec<&Collaborator> = users
        .iter()
        .filter(|user| user.is_online && user.current_node.as_deref() == Some(node_id))
        .collect();

    let visible = occupants
        .iter()
        .take(MAX_VISIBLE_BADGES)
        .map(|user| Badge {
            user_id: user.id.clone(),
            initials: initials(&user.name),
            color: user.color.clone(),
            name: user.name.clone(),
        })
        .collect();

    BadgeCluster {
        node_id: node_id.to_string(),
        visible,
        overflow: occupants.len().saturating_sub(MAX_VISIBLE_BADGES),
        being_edited: !occupants.is_empty(),
    }
}

/// Markers plus a badge cluster for every occupied node in `node_ids`
pub fn overlay<'a, I>(ctx: &dyn CollaborationContext, node_ids: I) -> PresenceOverlay
where
    I: IntoIterator<Item = &'a str>,
{
    let users = ctx.users();
    let clusters = node_ids
        .into_iter()
        .map(|node_id| cluster_for(&users, node_id))
        .filter(|cluster| cluster.being_edited)
        .collect();

    PresenceOverlay {
        markers: cursor_markers(ctx),
        clusters,
    }
}

/// Node ids of a stored flow; nodes without a string `id` are skipped
pub fn flow_node_ids(flow: &FlowRecord) -> Vec<&str> {
    flow.nodes
        .iter()
        .filter_map(|node| node.get("id").and_then(|id| id.as_str()))
        .collect()
}

pub fn overlay_for_flow(ctx: &dyn CollaborationContext, flow: &FlowRecord) -> PresenceOverlay {
    overlay(ctx, flow_node_ids(flow))
}

/// Open/closed state of the collaborator list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresencePanel {
    open: bool,
}

impl PresencePanel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Online collaborators, in context order
    pub fn online(ctx: &dyn CollaborationContext) -> Vec<Collaborator> {
        ctx.users().into_iter().filter(|u| u.is_online).collect()
    }
}

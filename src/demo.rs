//! Sample page used by the binaries.

use crate::{Document, Node, NodeId, Rectangle};
use anyhow::Result;

/// Handles to the interesting nodes of [`sample_page`]
#[derive(Debug, Clone)]
pub struct SamplePage {
    pub doc: Document,
    pub pricing: NodeId,
    pub cards: Vec<NodeId>,
    /// First card's call-to-action button
    pub cta: NodeId,
    pub sidebar: NodeId,
}

const PLANS: [(&str, &str, &str); 3] = [
    ("plan-starter", "Starter", "For side projects and trying things out."),
    ("plan-pro", "Pro", "Everything a growing team needs."),
    ("plan-team", "Team", "Seats, roles and audit history."),
];

/// A small marketing page: header, a pricing grid and a sidebar
pub fn sample_page(viewport: Rectangle) -> Result<SamplePage> {
    let mut doc = Document::new(viewport);
    let body = doc.root();

    let app = doc.insert(
        body,
        Node::new("div", viewport).with_dom_id("root"),
    )?;

    let header = doc.insert(
        app,
        Node::new("header", Rectangle::new(0.0, 0.0, viewport.width, 64.0))
            .with_class("site-header")
            .with_attribute("data-registry-id", "site-header"),
    )?;
    doc.insert(
        header,
        Node::new("h1", Rectangle::new(24.0, 12.0, 220.0, 40.0)).with_text("Acme Cloud"),
    )?;
    let nav = doc.insert(
        header,
        Node::new("nav", Rectangle::new(viewport.width - 340.0, 16.0, 300.0, 32.0)),
    )?;
    for (i, label) in ["Docs", "Pricing", "Sign in"].iter().enumerate() {
        doc.insert(
            nav,
            Node::new("a", Rectangle::new(viewport.width - 330.0 + i as f32 * 96.0, 20.0, 80.0, 24.0))
                .with_text(*label),
        )?;
    }

    let main = doc.insert(
        app,
        Node::new("main", Rectangle::new(0.0, 96.0, viewport.width - 300.0, viewport.height - 96.0)),
    )?;
    let pricing = doc.insert(
        main,
        Node::new("section", Rectangle::new(24.0, 120.0, 840.0, 420.0))
            .with_dom_id("pricing")
            .with_class("pricing-grid"),
    )?;

    let mut cards = Vec::new();
    let mut cta = None;
    for (i, (registry_id, title, blurb)) in PLANS.iter().enumerate() {
        let x = 40.0 + i as f32 * 272.0;
        let card = doc.insert(
            pricing,
            Node::new("article", Rectangle::new(x, 140.0, 256.0, 380.0))
                .with_class("card")
                .with_attribute("data-registry-id", *registry_id)
                .with_min_size(120.0, 160.0),
        )?;
        doc.insert(
            card,
            Node::new("h3", Rectangle::new(x + 16.0, 156.0, 224.0, 40.0)).with_text(*title),
        )?;
        doc.insert(
            card,
            Node::new("p", Rectangle::new(x + 16.0, 212.0, 224.0, 96.0)).with_text(*blurb),
        )?;
        let button = doc.insert(
            card,
            Node::new("button", Rectangle::new(x + 16.0, 452.0, 224.0, 48.0))
                .with_class("cta")
                .with_text("Choose plan"),
        )?;
        cta.get_or_insert(button);
        cards.push(card);
    }

    let sidebar = doc.insert(
        app,
        Node::new(
            "aside",
            Rectangle::new(viewport.width - 280.0, 96.0, 260.0, viewport.height - 120.0),
        )
        .with_dom_id("sidebar"),
    )?;
    let list = doc.insert(
        sidebar,
        Node::new("ul", Rectangle::new(viewport.width - 264.0, 112.0, 228.0, 200.0)),
    )?;
    for (i, item) in ["Changelog", "Status", "Support"].iter().enumerate() {
        doc.insert(
            list,
            Node::new("li", Rectangle::new(viewport.width - 256.0, 120.0 + i as f32 * 40.0, 212.0, 32.0))
                .with_text(*item),
        )?;
    }

    doc.clear_events();
    Ok(SamplePage {
        doc,
        pricing,
        cta: cta.unwrap_or(pricing),
        cards,
        sidebar,
    })
}

use shared_types::User;
use tracing::error;

use super::{quote_segment, ViewPipeline};
use crate::domain::envelope::{
    DashboardResponse, LinkHref, LinkType, NavigationDrawer, NavigationLink, NavigationResponse,
    PageResponse,
};
use crate::domain::error::PipelineError;

const DEFAULT_ICON: &str = "x";

impl ViewPipeline {
    /// Navigation tree, grouped by drawer in first-seen order.
    ///
    /// `href_base` is prefixed to every link, e.g. `""` or `"/admin"`.
    pub fn navigation(&self, href_base: &str) -> NavigationResponse {
        let mut drawers: Vec<NavigationDrawer> = Vec::new();

        let resources = self
            .config
            .resources
            .iter()
            .filter(|r| !r.hidden)
            .map(|r| {
                (
                    r.navigation.as_deref(),
                    NavigationLink {
                        name: r.name.clone(),
                        display: r.display_name().to_string(),
                        href: LinkHref::List(format!(
                            "{href_base}/resource/{}/list",
                            quote_segment(&r.name)
                        )),
                        kind: LinkType::Resource,
                    },
                )
            });
        let pages = self.config.pages.iter().map(|p| {
            (
                p.navigation.as_deref(),
                NavigationLink {
                    name: p.name.clone(),
                    display: p.display_name().to_string(),
                    href: LinkHref::View(format!(
                        "{href_base}/page/{}/view",
                        quote_segment(&p.name)
                    )),
                    kind: LinkType::Page,
                },
            )
        });

        for (drawer, link) in resources.chain(pages) {
            match drawers.iter_mut().find(|d| d.name.as_deref() == drawer) {
                Some(d) => d.links.push(link),
                None => drawers.push(NavigationDrawer {
                    name: drawer.map(str::to_string),
                    icon: drawer
                        .and_then(|d| self.config.navigation_icons.get(d))
                        .cloned()
                        .unwrap_or_else(|| DEFAULT_ICON.to_string()),
                    links: vec![link],
                }),
            }
        }

        NavigationResponse {
            name: self.config.name.clone(),
            icon_src: self.config.icon_src.clone(),
            version: self.config.version.clone(),
            navigation: drawers,
        }
    }

    /// Render a page. Private pages need a user.
    pub fn page_view(&self, name: &str, user: Option<&User>) -> Result<PageResponse, PipelineError> {
        let page = self.page(name)?;
        if !page.public && user.is_none() {
            return Err(PipelineError::Unauthorized);
        }
        Ok(PageResponse {
            display: page.display_name().to_string(),
            name: page.name.clone(),
            content: page.content.render(None),
            kind: page.kind,
        })
    }

    pub fn dashboard(&self, user: &User) -> Result<DashboardResponse, PipelineError> {
        let content = (self.config.dashboard)(user).map_err(|e| {
            error!(user = %user.email, error = %e, "Dashboard generation failed");
            PipelineError::Upstream(e.to_string())
        })?;
        Ok(DashboardResponse { content })
    }
}

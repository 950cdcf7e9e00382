use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use newswatch_core::error::FetchError;
use tokio::sync::{OnceCell, OwnedSemaphorePermit, Semaphore};

/// Fixed-size pool of rendering slots.
///
/// A slot must be held for the whole lifetime of a rendered fetch and is
/// released when the permit drops, so at most `size` browser tabs exist at
/// any moment regardless of how many fetches are queued.
#[derive(Clone)]
pub struct RenderSlots {
    semaphore: Arc<Semaphore>,
    size: usize,
}

impl RenderSlots {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, FetchError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| FetchError::Browser("render pool closed".into()))
    }
}

/// Headless-browser page renderer over the Chrome DevTools Protocol.
///
/// One Chromium process is launched lazily on the first rendered fetch and
/// shared for the life of the pool. Each `render` call takes a slot, opens
/// a fresh tab, waits for the page body, reads the rendered DOM, and closes
/// the tab on every exit path, including timeout.
pub struct BrowserPool {
    browser: OnceCell<Arc<Browser>>,
    slots: RenderSlots,
    timeout: Duration,
}

impl BrowserPool {
    pub fn new(pool_size: usize, timeout: Duration) -> Self {
        Self {
            browser: OnceCell::new(),
            slots: RenderSlots::new(pool_size),
            timeout,
        }
    }

    pub fn slots(&self) -> &RenderSlots {
        &self.slots
    }

    pub async fn render(&self, url: &str) -> Result<String, FetchError> {
        let _slot = self.slots.acquire().await?;
        let browser = self
            .browser
            .get_or_try_init(|| launch_browser(self.timeout))
            .await?;

        // Tab creation runs as its own task: if it outlives the deadline the
        // late tab is closed instead of leaking in the browser.
        let create = tokio::spawn({
            let browser = Arc::clone(browser);
            let url = url.to_string();
            async move { browser.new_page(url).await }
        });
        let page = deadline_or_cleanup(self.timeout, create, |created| async move {
            if let Ok(page) = created {
                let _ = page.close().await;
            }
        })
        .await
        .ok_or(FetchError::Timeout(self.timeout.as_secs()))?
        .map_err(|e| FetchError::Browser(format!("failed to navigate to {url}: {e}")))?;

        let outcome = tokio::time::timeout(self.timeout, async {
            // <body> appearing is the minimal signal that the page rendered
            // its main content.
            page.find_element("body")
                .await
                .map_err(|e| FetchError::ElementNotFound(format!("body in {url}: {e}")))?;
            page.content()
                .await
                .map_err(|e| FetchError::Browser(format!("failed to read page content: {e}")))
        })
        .await;

        // The tab is closed before the slot is released, on success, error,
        // and timeout alike.
        let _ = page.close().await;

        match outcome {
            Ok(inner) => inner,
            Err(_) => Err(FetchError::Timeout(self.timeout.as_secs())),
        }
    }
}

/// Await a spawned creation task, giving up after `deadline`. A resource the
/// task produces after the deadline has passed is handed to `cleanup` rather
/// than dropped while half-alive on the remote end.
async fn deadline_or_cleanup<T, C, Fut>(
    deadline: Duration,
    mut task: tokio::task::JoinHandle<T>,
    cleanup: C,
) -> Option<T>
where
    T: Send + 'static,
    C: FnOnce(T) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    match tokio::time::timeout(deadline, &mut task).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(_)) => None,
        Err(_) => {
            tokio::spawn(async move {
                if let Ok(value) = task.await {
                    cleanup(value).await;
                }
            });
            None
        }
    }
}

async fn launch_browser(timeout: Duration) -> Result<Arc<Browser>, FetchError> {
    let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

    // Snap-packaged Chromium ships a wrapper that strips standard Chrome CLI
    // flags, so prefer an explicitly located binary when one exists.
    if let Some(bin) = find_chrome_binary() {
        tracing::info!("Using Chrome binary: {}", bin.display());
        builder = builder.chrome_executable(bin);
    }

    let config = builder
        .arg("--headless=new")
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-popup-blocking")
        .arg("--no-first-run")
        .build()
        .map_err(|e| FetchError::Browser(format!("browser config error: {e}")))?;

    let (browser, mut handler) = tokio::time::timeout(timeout, Browser::launch(config))
        .await
        .map_err(|_| FetchError::Timeout(timeout.as_secs()))?
        .map_err(|e| FetchError::Browser(format!("failed to launch browser: {e}")))?;

    // The CDP handler must be polled continuously for the connection to work.
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                tracing::warn!("Browser CDP handler error: {event:?}");
                break;
            }
        }
    });

    Ok(Arc::new(browser))
}

/// Locate a Chrome/Chromium binary, honouring `CHROME_BIN` first and then
/// well-known install locations. `None` lets chromiumoxide do its own lookup.
fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates: &[&str] = &[
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];
    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}

//! DOM, input, and script operations for the CDP session, plus the
//! [`BrowserSession`] implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::client::CdpBrowser;
use crate::browser::{BrowserError, BrowserSession, ElementHandle};

const POLL_INTERVAL: Duration = Duration::from_millis(150);

impl CdpBrowser {
    async fn evaluate_value(&self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("unknown error");
            return Err(BrowserError::Script(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    async fn document_node(&self) -> Result<i64, BrowserError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": 0})))
            .await?;
        result["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| BrowserError::InvalidResponse("missing document node".to_string()))
    }

    async fn query_selector_on(
        &self,
        node_id: i64,
        selector: &str,
    ) -> Result<Option<i64>, BrowserError> {
        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({"nodeId": node_id, "selector": selector})),
            )
            .await?;

        let node_id = result["nodeId"].as_i64().unwrap_or(0);
        if node_id == 0 {
            Ok(None)
        } else {
            Ok(Some(node_id))
        }
    }

    async fn query_selector_all_on(
        &self,
        node_id: i64,
        selector: &str,
    ) -> Result<Vec<i64>, BrowserError> {
        let result = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({"nodeId": node_id, "selector": selector})),
            )
            .await?;

        let node_ids = result["nodeIds"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();

        Ok(node_ids)
    }

    async fn resolve_object(&self, node_id: i64) -> Result<String, BrowserError> {
        let result = self
            .call("DOM.resolveNode", Some(json!({"nodeId": node_id})))
            .await?;
        result["object"]["objectId"]
            .as_str()
            .map(|id| id.to_string())
            .ok_or_else(|| BrowserError::InvalidResponse("node has no remote object".to_string()))
    }

    async fn call_on_node(
        &self,
        node_id: i64,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, BrowserError> {
        let object_id = self.resolve_object(node_id).await?;
        let arguments: Vec<Value> = args.into_iter().map(|v| json!({"value": v})).collect();

        let result = self
            .call(
                "Runtime.callFunctionOn",
                Some(json!({
                    "objectId": object_id,
                    "functionDeclaration": function,
                    "arguments": arguments,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("unknown error");
            return Err(BrowserError::Script(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    async fn box_center(&self, node_id: i64) -> Result<Option<(f64, f64)>, BrowserError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await;

        match result {
            Ok(model) => {
                let quad: Vec<f64> = model["model"]["content"]
                    .as_array()
                    .map(|arr| arr.iter().filter_map(|v| v.as_f64()).collect())
                    .unwrap_or_default();
                if quad.len() >= 8 {
                    let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
                    let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
                    Ok(Some((x, y)))
                } else {
                    Ok(None)
                }
            }
            // -32000: node has no box (hidden or detached).
            Err(BrowserError::Protocol { code: -32000, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn mouse_click(&self, x: f64, y: f64) -> Result<(), BrowserError> {
        for event in ["mousePressed", "mouseReleased"] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event,
                    "x": x,
                    "y": y,
                    "button": "left",
                    "clickCount": 1,
                })),
            )
            .await?;
        }
        Ok(())
    }

    async fn select_all(&self) -> Result<(), BrowserError> {
        for event in ["rawKeyDown", "keyUp"] {
            self.call(
                "Input.dispatchKeyEvent",
                Some(json!({
                    "type": event,
                    "key": "a",
                    // bit 2 = Control
                    "modifiers": 2,
                })),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for CdpBrowser {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|v| v.as_str()) {
            if !error.is_empty() {
                return Err(BrowserError::Navigation(error.to_string()));
            }
        }

        let start = std::time::Instant::now();
        loop {
            let state = self.evaluate_value("document.readyState").await?;
            if let Some(state) = state.as_str() {
                if state == "complete" || state == "interactive" {
                    debug!("navigated to {}", url);
                    return Ok(());
                }
            }
            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout(format!("page load of {url}")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.evaluate_value("window.location.href").await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<bool, BrowserError> {
        let start = std::time::Instant::now();
        loop {
            let root = self.document_node().await?;
            match self.query_selector_on(root, selector).await {
                Ok(Some(node_id)) => {
                    if self.box_center(node_id).await?.is_some() {
                        return Ok(true);
                    }
                }
                Ok(None) => {}
                // A rejected selector never becomes visible.
                Err(BrowserError::Protocol { .. }) => return Ok(false),
                Err(err) => return Err(err),
            }
            if start.elapsed() > timeout {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_first(
        &self,
        selectors: &[&str],
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let root = self.document_node().await?;
        for selector in selectors {
            match self.query_selector_on(root, selector).await {
                Ok(Some(node_id)) => return Ok(Some(ElementHandle(node_id))),
                Ok(None) => {}
                // Skip candidates the browser rejects outright.
                Err(BrowserError::Protocol { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let root = self.document_node().await?;
        match self.query_selector_all_on(root, selector).await {
            Ok(ids) => Ok(ids.into_iter().map(ElementHandle).collect()),
            Err(BrowserError::Protocol { .. }) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn find_in_first(
        &self,
        scope: ElementHandle,
        selectors: &[&str],
    ) -> Result<Option<ElementHandle>, BrowserError> {
        for selector in selectors {
            match self.query_selector_on(scope.0, selector).await {
                Ok(Some(node_id)) => return Ok(Some(ElementHandle(node_id))),
                Ok(None) => {}
                Err(BrowserError::Protocol { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    async fn find_in_all(
        &self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        match self.query_selector_all_on(scope.0, selector).await {
            Ok(ids) => Ok(ids.into_iter().map(ElementHandle).collect()),
            Err(BrowserError::Protocol { .. }) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn text(&self, element: ElementHandle) -> Result<String, BrowserError> {
        let value = self
            .call_on_node(
                element.0,
                "function() { return (this.innerText || this.textContent || '').trim(); }",
                Vec::new(),
            )
            .await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    async fn attr(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let result = self
            .call("DOM.getAttributes", Some(json!({"nodeId": element.0})))
            .await?;
        let attributes = result["attributes"].as_array().cloned().unwrap_or_default();

        // Flat [name, value, name, value, ...] pairs.
        for pair in attributes.chunks(2) {
            if let [key, value] = pair {
                if key.as_str() == Some(name) {
                    return Ok(value.as_str().map(|v| v.to_string()));
                }
            }
        }
        Ok(None)
    }

    async fn input_value(&self, element: ElementHandle) -> Result<String, BrowserError> {
        let value = self
            .call_on_node(
                element.0,
                "function() { return this.value || ''; }",
                Vec::new(),
            )
            .await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    async fn fill(&self, element: ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.call("DOM.focus", Some(json!({"nodeId": element.0})))
            .await?;
        self.select_all().await?;
        self.call("Input.insertText", Some(json!({"text": text})))
            .await?;
        Ok(())
    }

    async fn click(&self, element: ElementHandle) -> Result<(), BrowserError> {
        self.call_on_node(
            element.0,
            "function() { this.scrollIntoView({block: 'center', inline: 'nearest'}); }",
            Vec::new(),
        )
        .await?;

        match self.box_center(element.0).await? {
            Some((x, y)) => self.mouse_click(x, y).await,
            // Hidden targets (collapsed menus, offscreen buttons) still
            // accept a synthetic click.
            None => {
                self.call_on_node(element.0, "function() { this.click(); }", Vec::new())
                    .await?;
                Ok(())
            }
        }
    }

    async fn select_option(
        &self,
        element: ElementHandle,
        label: &str,
    ) -> Result<bool, BrowserError> {
        let value = self
            .call_on_node(
                element.0,
                r#"function(want) {
                    const target = String(want).toLowerCase();
                    const options = Array.from(this.options || []);
                    let index = options.findIndex(
                        (o) => o.label.toLowerCase() === target || o.value.toLowerCase() === target
                    );
                    if (index < 0) {
                        index = options.findIndex((o) => o.label.toLowerCase().includes(target));
                    }
                    if (index < 0) return false;
                    this.selectedIndex = index;
                    this.dispatchEvent(new Event('change', { bubbles: true }));
                    return true;
                }"#,
                vec![json!(label)],
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn upload_file(
        &self,
        element: ElementHandle,
        path: &Path,
    ) -> Result<(), BrowserError> {
        self.call(
            "DOM.setFileInputFiles",
            Some(json!({
                "files": [path.to_string_lossy()],
                "nodeId": element.0,
            })),
        )
        .await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        self.evaluate_value(script).await
    }

    async fn visible_text(&self) -> Result<String, BrowserError> {
        let value = self
            .evaluate_value("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }
}

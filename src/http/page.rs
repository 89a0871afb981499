//! Server-rendered mint page.

use std::fmt::Write;

use crate::mint::PageState;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the page. `notice` is shown once as an alert.
pub fn render(state: &PageState, notice: Option<&str>) -> String {
    let mut body = String::new();

    if let Some(notice) = notice {
        let _ = writeln!(body, r#"<div class="notice" role="alert">{}</div>"#, escape(notice));
    }

    match &state.session.address {
        Some(address) => {
            body.push_str("<div>\n");
            body.push_str(
                r#"<form method="post" action="/disconnect"><button type="submit">Disconnect</button></form>"#,
            );
            let _ = writeln!(body, "\n<div>user address: {}</div>", escape(address));
            let _ = writeln!(
                body,
                "<div>Balance: {}</div>",
                escape(state.session.balance.as_deref().unwrap_or(""))
            );
            body.push_str("</div>\n");
        }
        None => body.push_str(
            "<form method=\"post\" action=\"/connect\"><button type=\"submit\">Connect Wallet</button></form>\n",
        ),
    }

    let _ = writeln!(body, "<div>contract address: {}</div>", escape(&state.contract_address));

    if let Some(view) = &state.contract {
        let _ = writeln!(
            body,
            r#"<form method="post" action="/mint"><input type="number" name="quantity" min="1" step="1" max="{}" placeholder="Enter the purchase quantity" required> <button type="submit">Mint</button></form>"#,
            view.max_purchase
        );
        let _ = writeln!(
            body,
            "<div>\n<div>Max supply : {}</div>\n<div>Max purchase allowed : {}</div>\n<div>mint price for 1 kangroo: {} XTZ</div>\n<div>number of tokens minted yet: {}</div>\n</div>",
            view.max_supply,
            view.max_purchase,
            view.mint_price.to_tez_string(),
            view.minted_count
        );
        if view.paused {
            body.push_str("<div>Minting is paused</div>\n");
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>KraznikUnderverse</title>\n</head>\n<body>\n<div class=\"App\">\n{}</div>\n</body>\n</html>\n",
        body
    )
}

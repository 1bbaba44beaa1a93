//! HTML for the mock CAS login page.

/// Escape HTML special characters to prevent XSS.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn login_page(service: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Mock CAS Sign In (DEV ONLY)</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, sans-serif;
            max-width: 400px;
            margin: 100px auto;
            padding: 20px;
        }}
        .warning {{
            background: #fff3cd;
            border: 1px solid #ffc107;
            padding: 15px;
            border-radius: 8px;
            margin-bottom: 20px;
        }}
        form {{
            background: #f8f9fa;
            padding: 20px;
            border-radius: 8px;
        }}
        label {{
            display: block;
            margin-bottom: 5px;
            font-weight: 500;
        }}
        input[type="text"] {{
            width: 100%;
            padding: 10px;
            margin-bottom: 15px;
            border: 1px solid #ced4da;
            border-radius: 4px;
            box-sizing: border-box;
        }}
        button {{
            width: 100%;
            padding: 12px;
            background: #00693e;
            color: white;
            border: none;
            border-radius: 4px;
            cursor: pointer;
        }}
    </style>
</head>
<body>
    <div class="warning">
        <p>This is a <strong>mock CAS login</strong>. Enter any netid to sign in.</p>
    </div>

    <form action="/auth/mock/login" method="POST">
        <input type="hidden" name="service" value="{service}" />

        <label for="netid">NetID</label>
        <input type="text" id="netid" name="netid" placeholder="d12345a" required />

        <label for="name">Name (optional)</label>
        <input type="text" id="name" name="name" placeholder="Jane Doe" />

        <button type="submit">Sign in</button>
    </form>
</body>
</html>"#,
        service = html_escape(service),
    )
}

//! Static API documentation page served at `/`.

use axum::response::Html;

const ENDPOINTS: &[(&str, &str)] = &[
    ("POST", "/ledger/init"),
    ("GET", "/assets"),
    ("POST", "/asset"),
    ("PUT", "/asset"),
    ("POST", "/asset/transfer"),
    ("GET", "/asset/{id}"),
    ("GET", "/asset/{id}/history"),
    ("GET", "/health"),
];

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>API Documentation</title>
<style>
body {
  font-family: Arial, sans-serif; background: #f4f7fb; color: #333;
  margin: 0; display: flex; justify-content: center;
}
.container {
  background: #fff; max-width: 900px; width: 100%; border-radius: 8px;
  box-shadow: 0 4px 12px rgba(0,0,0,.1); padding: 40px; margin: 20px;
}
h1, h3, p { text-align: center; }
ul { list-style: none; padding: 0; }
li {
  background: #e5e7eb; border-radius: 6px; margin: 10px 0; padding: 15px;
  display: flex; justify-content: space-between;
}
button {
  padding: 5px 10px; background: #2563eb; color: #fff; border: none;
  border-radius: 4px; cursor: pointer;
}
</style>
</head>
<body>
<div class="container">
<h1>API Documentation</h1>
<p>Use any HTTP client to interact with the endpoints listed below.</p>
<h3>Available Endpoints:</h3>
<ul>
"#;

const TAIL: &str = r#"</ul>
</div>
<script>
function copyToClipboard(text) {
  navigator.clipboard.writeText(text).then(
    () => alert('URL copied to clipboard!'),
    () => alert('Failed to copy URL'));
}
</script>
</body>
</html>
"#;

/// Render the documentation page.
pub fn render() -> String {
    let mut page = String::from(HEAD);
    for (method, path) in ENDPOINTS {
        page.push_str(&format!("<li><span>{method} {path}</span>"));
        page.push_str(&format!(
            "<button onclick=\"copyToClipboard('{path}')\">Copy URL</button></li>\n"
        ));
    }
    page.push_str(TAIL);
    page
}

pub async fn index() -> Html<String> {
    Html(render())
}

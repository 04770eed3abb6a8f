//! Static HTML pages served by the local server.

/// Path of the sign-in entry point behind the login proxy.
pub const EMBEDDED_SETUP_PATH: &str = "/glogin/EmbeddedSetup?source=android&xoauth_display_name=Android+Device&lang=en&cc=us&langCountry=en_us&hl=en-US&tmpl=new_account";

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Inter', -apple-system, sans-serif; background: #0f0f23; color: #e0e0e0; min-height: 100vh; }
h1 { color: #4fc3f7; margin-bottom: 0.5rem; }
.subtitle { color: #888; margin-bottom: 2rem; font-size: 14px; }
.card { background: #1a1a2e; border: 1px solid #333; border-radius: 12px; padding: 1.5rem; margin-bottom: 1.5rem; }
.btn { display: inline-block; background: #fff; color: #3c4043; padding: 14px 28px; border-radius: 8px; font-size: 16px; text-decoration: none; border: none; cursor: pointer; }
.status { margin-top: 1.5rem; padding: 1rem; border-radius: 8px; display: none; white-space: pre-line; }
.status.waiting { display: block; border: 1px solid #4fc3f7; color: #4fc3f7; }
.status.success { display: block; border: 1px solid #4caf50; color: #4caf50; }
.status.error { display: block; border: 1px solid #f44336; color: #f44336; }
.dot { display: inline-block; width: 12px; height: 12px; border-radius: 50%; margin-right: 6px; }
.dot.green { background: #4caf50; }
.dot.red { background: #f44336; }
label { display: block; color: #aaa; margin-bottom: 0.5rem; font-size: 0.9em; }
select, input { width: 100%; padding: 0.75rem; background: #0f0f23; color: #fff; border: 1px solid #444; border-radius: 8px; font-size: 1rem; margin-bottom: 1rem; }
.result { background: #0a0a1a; border: 1px solid #333; border-radius: 8px; padding: 1rem; word-break: break-all; font-family: monospace; margin-top: 1rem; white-space: pre-line; }
.result.error { border-color: #f44336; color: #f44336; }
.result.success { border-color: #4caf50; }
"#;

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>droidauth - Sign In</title>
<style>__STYLE__
body { display: flex; align-items: center; justify-content: center; }
.container { text-align: center; max-width: 420px; padding: 2rem; }
</style>
</head>
<body>
<div class="container">
  <h1>droidauth</h1>
  <p class="subtitle">Sign in with your Google account to generate auth tokens</p>
  <a class="btn" id="signin" href="__SETUP_PATH__" target="_blank">Sign in with Google</a>
  <div id="status" class="status"></div>
  <p class="subtitle" style="margin-top:2rem">
    The sign-in page is relayed through this local proxy.<br>
    Credentials go to Google; the proxy only reads the login cookie.
  </p>
</div>
<script>
  var statusEl = document.getElementById('status');
  var timer = null;
  function poll() {
    fetch('/api/login-status')
      .then(function(r) { return r.json(); })
      .then(function(d) {
        if (d.phase !== 'resolved') return;
        clearInterval(timer);
        if (d.error) {
          statusEl.className = 'status error';
          statusEl.textContent = 'Login failed: ' + d.error;
        } else {
          statusEl.className = 'status success';
          statusEl.textContent = 'Login successful! Email: ' + d.email + '\nYou can now use the token API.';
        }
      });
  }
  document.getElementById('signin').addEventListener('click', function() {
    statusEl.className = 'status waiting';
    statusEl.textContent = 'Waiting for sign-in to complete...';
    if (!timer) timer = setInterval(poll, 2000);
  });
</script>
</body>
</html>
"#;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>droidauth - Token Server</title>
<style>__STYLE__
body { padding: 2rem; }
button { background: linear-gradient(135deg, #4fc3f7, #2196f3); color: #fff; border: none; padding: 0.75rem 2rem; border-radius: 8px; cursor: pointer; font-size: 1rem; }
</style>
</head>
<body>
<h1>droidauth</h1>
<p class="subtitle">Token server on port __PORT__</p>

<div class="card">
  <h3>Status</h3>
  <div id="status">Loading...</div>
</div>

<div class="card">
  <h3>Fetch Token</h3>
  <label for="scope">Service</label>
  <select id="scope"><option value="custom">Custom scope...</option></select>
  <div id="customDiv" style="display:none">
    <label for="custom">Custom OAuth2 scope</label>
    <input type="text" id="custom" placeholder="oauth2:https://www.googleapis.com/auth/...">
  </div>
  <button onclick="fetchToken()">Get Token</button>
  <div id="result" class="result" style="display:none"></div>
</div>

<script>
  var scopeEl = document.getElementById('scope');
  scopeEl.onchange = function() {
    document.getElementById('customDiv').style.display = this.value === 'custom' ? 'block' : 'none';
  };

  fetch('/api/apps').then(function(r) { return r.json(); }).then(function(apps) {
    Object.keys(apps).forEach(function(name) {
      var opt = document.createElement('option');
      opt.value = name;
      opt.textContent = apps[name].display_name;
      scopeEl.insertBefore(opt, scopeEl.lastElementChild);
    });
    scopeEl.selectedIndex = 0;
  });

  fetch('/api/status').then(function(r) { return r.json(); }).then(function(s) {
    var el = document.getElementById('status');
    el.innerHTML =
      '<span class="dot ' + (s.registered ? 'green' : 'red') + '"></span>Registered: ' + (s.registered ? 'Yes' : 'No') +
      '&nbsp;&nbsp;<span class="dot ' + (s.logged_in ? 'green' : 'red') + '"></span>Logged in: ' +
      (s.logged_in ? s.email : 'No <a href="/login" style="color:#4fc3f7">(sign in)</a>');
  });

  function fetchToken() {
    var scope = scopeEl.value;
    if (scope === 'custom') scope = document.getElementById('custom').value;
    var el = document.getElementById('result');
    el.style.display = 'block';
    el.className = 'result';
    el.textContent = 'Fetching...';
    fetch('/api/token?scope=' + encodeURIComponent(scope))
      .then(function(r) { return r.json(); })
      .then(function(d) {
        if (d.error) {
          el.className = 'result error';
          el.textContent = 'Error: ' + d.error;
        } else {
          el.className = 'result success';
          el.textContent = d.token_type.toUpperCase() + ' token:\n' + d.token;
        }
      })
      .catch(function(e) {
        el.className = 'result error';
        el.textContent = 'Network error: ' + e.message;
      });
  }
</script>
</body>
</html>
"#;

/// Landing page with the sign-in link and a completion poller.
pub fn login_page() -> String {
    LOGIN_PAGE
        .replace("__STYLE__", STYLE)
        .replace("__SETUP_PATH__", EMBEDDED_SETUP_PATH)
}

/// Token server UI.
pub fn index_page(port: u16) -> String {
    INDEX_PAGE
        .replace("__STYLE__", STYLE)
        .replace("__PORT__", &port.to_string())
}

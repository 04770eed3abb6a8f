//! Script injected into proxied login pages.
//!
//! The sign-in flow expects to run inside the Play services WebView and
//! calls a `window.mm` object for device identity and UI control. The
//! script below provides that object and overrides `closeView`, which the
//! page calls once sign-in finishes, to notify the local server.

use droidauth_config::Config;

/// Play services version reported to the page.
const GMS_VERSION_CODE: u32 = 224_714_044;

const BRIDGE_TEMPLATE: &str = r#"
Object.defineProperty(navigator, 'userAgent', { get: function() { return __USER_AGENT__; } });
Object.defineProperty(navigator, 'platform', { get: function() { return 'Linux armv8l'; } });
Object.defineProperty(navigator, 'appVersion', { get: function() { return __APP_VERSION__; } });
Object.defineProperty(navigator, 'vendor', { get: function() { return 'Google Inc.'; } });
Object.defineProperty(navigator, 'maxTouchPoints', { get: function() { return 5; } });

window.mm = {
    getAndroidId: function() { return __ANDROID_ID__; },
    getBuildVersionSdk: function() { return __SDK_VERSION__; },
    getPlayServicesVersionCode: function() { return __GMS_VERSION__; },
    getAuthModuleVersionCode: function() { return __GMS_VERSION__; },

    getAccounts: function() { return '[]'; },
    getAllowedDomains: function() { return '[]'; },
    getDeviceDataVersionInfo: function() { return 1; },
    getDeviceContactsCount: function() { return -1; },
    getFactoryResetChallenges: function() { return '[]'; },

    getPhoneNumber: function() { return null; },
    getSimSerial: function() { return null; },
    getSimState: function() { return 1; },
    hasPhoneNumber: function() { return false; },
    hasTelephony: function() { return false; },
    fetchVerifiedPhoneNumber: function() { return null; },
    isUserOwner: function() { return true; },

    showView: function() {},
    closeView: function() {},
    hideKeyboard: function() {},
    showKeyboard: function() {},
    setBackButtonEnabled: function(b) {},
    setPrimaryActionEnabled: function(b) {},
    setPrimaryActionLabel: function(s, i) {},
    setSecondaryActionEnabled: function(b) {},
    setSecondaryActionLabel: function(s, i) {},
    setAllActionsEnabled: function(b) {},
    setAccountIdentifier: function(name) {},
    setNewAccountCreated: function() {},

    addAccount: function(json) {},
    attemptLogin: function(name, pass) {},
    skipLogin: function() {},
    goBack: function() {},
    log: function(s) { console.log('[droidauth] mm.log: ' + s); },

    backupSyncOptIn: function(name) {},
    clearOldLoginAttempts: function() {},
    notifyOnTermsOfServiceAccepted: function() {},
    fetchIIDToken: function(entity) {},
    startAfw: function() {},
    launchEmergencyDialer: function() {}
};

(function() {
    var origClose = window.mm.closeView;
    window.mm.closeView = function() {
        fetch(__EXTRACT_URL__, { method: 'POST' })
            .then(function(r) { return r.json(); })
            .then(function(d) {
                if (d.success) {
                    document.title = 'LOGIN_SUCCESS';
                    document.body.innerHTML =
                        '<div style="display:flex;flex-direction:column;align-items:center;' +
                        'justify-content:center;height:100vh;background:#0f0f23;color:#4caf50;' +
                        'font-family:sans-serif;font-size:24px">' +
                        '<div>Login successful!</div>' +
                        '<div style="color:#888;font-size:14px;margin-top:8px">You can close this tab.</div>' +
                        '</div>';
                }
            });
        if (origClose) origClose.apply(this, arguments);
    };
})();
"#;

/// Build the bridge script for `state`, reporting back to `base`.
pub fn build_bridge_script(state: &Config, base: &str) -> String {
    let device = &state.device;
    let app_version = format!(
        "5.0 (Linux; Android {}; {} Build/{}; wv) AppleWebKit/537.36",
        device.sdk_version, device.model, device.build_id
    );

    BRIDGE_TEMPLATE
        .replace("__USER_AGENT__", &js_string(&state.user_agent()))
        .replace("__APP_VERSION__", &js_string(&app_version))
        .replace("__ANDROID_ID__", &js_string(&state.android_id))
        .replace("__SDK_VERSION__", &device.sdk_version.to_string())
        .replace("__GMS_VERSION__", &GMS_VERSION_CODE.to_string())
        .replace("__EXTRACT_URL__", &js_string(&format!("{base}/api/proxy-extract")))
}

/// The bridge wrapped in a `<script>` element.
pub fn bridge_script_tag(state: &Config, base: &str) -> String {
    format!("<script>{}</script>", build_bridge_script(state, base))
}

/// Quote `s` as a JS string literal that cannot close the script element.
fn js_string(s: &str) -> String {
    serde_json::Value::from(s)
        .to_string()
        .replace("</", "<\\/")
}

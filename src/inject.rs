// Scripts evaluated inside the Duelingbook page. Each one is an IIFE and safe to
// run again on the same document.

pub const THEME_STYLE_ID: &str = "duelingbook-theme";

pub const AD_IDS: [&str; 5] = ["mes1", "mes2", "mes3", "mes4", "ezmob-wrapper"];
pub const AD_ID_FRAGMENT: &str = "ezmob";

const VOLUME_SCRIPT: &str = r#"
(function() {
    const state = window.__duelingbookAudio || (window.__duelingbookAudio = {
        context: null,
        gain: null,
        routed: new WeakSet(),
        observer: null,
    });

    if (!state.context) {
        const AudioContextClass = window.AudioContext || window.webkitAudioContext;
        if (!AudioContextClass) {
            console.warn('DUEL-VOLUME: Web Audio unavailable, volume control disabled');
            return;
        }
        state.context = new AudioContextClass();
        state.gain = state.context.createGain();
        state.gain.connect(state.context.destination);

        // Autoplay policy may leave the context suspended until the user interacts.
        const resume = () => {
            if (state.context.state === 'suspended') {
                state.context.resume().catch(() => {});
            }
        };
        document.addEventListener('pointerdown', resume, true);
        document.addEventListener('keydown', resume, true);
    }

    state.gain.gain.value = __INITIAL_GAIN__;

    const route = (media) => {
        if (state.routed.has(media)) return;
        try {
            const source = state.context.createMediaElementSource(media);
            source.connect(state.gain);
            state.routed.add(media);
        } catch (err) {
            console.warn('DUEL-VOLUME: Could not route media element', err);
        }
    };

    document.querySelectorAll('audio, video').forEach(route);

    if (!state.observer && document.body) {
        state.observer = new MutationObserver((mutations) => {
            mutations.forEach((mutation) => {
                mutation.addedNodes.forEach((node) => {
                    if (node.nodeType !== 1) return;
                    if (node.matches('audio, video')) route(node);
                    node.querySelectorAll('audio, video').forEach(route);
                });
            });
        });
        state.observer.observe(document.body, { childList: true, subtree: true });
    }

    window.setVolume = (value) => {
        state.gain.gain.value = value;
    };
})();
"#;

const HIDE_ADS_SCRIPT: &str = r#"
(function() {
    const adIds = __AD_IDS__;
    const fragment = __AD_FRAGMENT__;

    const isAd = (el) => !!el.id && (adIds.includes(el.id) || el.id.includes(fragment));
    const hide = (el) => { el.style.display = 'none'; };

    adIds.forEach((id) => {
        const el = document.getElementById(id);
        if (el) hide(el);
    });
    document.querySelectorAll('[id*="' + fragment + '"]').forEach(hide);

    if (window.__duelingbookAdObserver || !document.body) return;

    window.__duelingbookAdObserver = new MutationObserver((mutations) => {
        mutations.forEach((mutation) => {
            mutation.addedNodes.forEach((node) => {
                if (node.nodeType !== 1) return;
                if (isAd(node)) hide(node);
                node.querySelectorAll('[id]').forEach((child) => {
                    if (isAd(child)) hide(child);
                });
            });
        });
    });
    window.__duelingbookAdObserver.observe(document.body, { childList: true, subtree: true });
})();
"#;

const THEME_SCRIPT: &str = r#"
(function() {
    const styleId = __STYLE_ID__;
    const css = __CSS__;

    const existing = document.getElementById(styleId);
    if (existing) existing.remove();
    if (css === null) return;

    const style = document.createElement('style');
    style.id = styleId;
    style.textContent = css;
    (document.head || document.documentElement).appendChild(style);
})();
"#;

// Installed as an initialization script, so it runs before the page's own code on
// every navigation.
const CONTEXT_MENU_HOOK: &str = r#"
(function() {
    if (window.__duelingbookContextMenu) return;
    window.__duelingbookContextMenu = true;

    document.addEventListener('contextmenu', (event) => {
        const tauri = window.__TAURI__;
        const invoke = tauri && (tauri.core ? tauri.core.invoke : tauri.invoke);
        if (!invoke) return;
        event.preventDefault();
        invoke('show_context_menu').catch((err) => console.error('DUEL-MENU: Popup failed:', err));
    }, true);
})();
"#;

fn js_string(value: &str) -> String {
    // serde_json string output is a valid JS string literal.
    serde_json::Value::String(value.to_string()).to_string()
}

fn js_number(value: f64) -> String {
    if value.is_finite() {
        format!("{}", value)
    } else {
        "1".to_string()
    }
}

pub fn volume_control_script(initial_gain: f64) -> String {
    VOLUME_SCRIPT.replace("__INITIAL_GAIN__", &js_number(initial_gain))
}

pub fn set_volume_script(gain: f64) -> String {
    format!(
        "if (typeof window.setVolume === 'function') window.setVolume({});",
        js_number(gain)
    )
}

pub fn hide_ads_script() -> String {
    let ids = serde_json::Value::from(AD_IDS.to_vec()).to_string();
    HIDE_ADS_SCRIPT
        .replace("__AD_IDS__", &ids)
        .replace("__AD_FRAGMENT__", &js_string(AD_ID_FRAGMENT))
}

/// Swaps the injected theme stylesheet. `None` removes it and leaves the site's own styles.
pub fn theme_script(css: Option<&str>) -> String {
    let css = match css {
        Some(css) => js_string(css),
        None => "null".to_string(),
    };
    // CSS goes last so a stylesheet containing a placeholder name can't be rewritten.
    THEME_SCRIPT
        .replace("__STYLE_ID__", &js_string(THEME_STYLE_ID))
        .replace("__CSS__", &css)
}

pub fn context_menu_hook() -> &'static str {
    CONTEXT_MENU_HOOK
}

/// The scripts evaluated after every finished page load, in order.
pub fn page_load_scripts(volume: f64, theme_css: Option<&str>) -> [String; 3] {
    [
        volume_control_script(volume),
        hide_ads_script(),
        theme_script(theme_css),
    ]
}

//! The listener wire contract.
//!
//! Existing listener implementations look these methods up by name and JVM
//! type signature, so both strings must stay byte-for-byte as they are.

/// One listener method: name plus JVM type signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerMethod {
    pub name: &'static str,
    pub signature: &'static str,
}

pub const ON_LOADING_STATE_CHANGE: ListenerMethod = ListenerMethod {
    name: "onLoadingStateChange",
    signature: "(Lorg/cef/browser/CefBrowser;ZZZ)V",
};

pub const ON_LOAD_START: ListenerMethod = ListenerMethod {
    name: "onLoadStart",
    signature: "(Lorg/cef/browser/CefBrowser;Lorg/cef/browser/CefFrame;\
                Lorg/cef/network/CefRequest$TransitionType;)V",
};

pub const ON_LOAD_END: ListenerMethod = ListenerMethod {
    name: "onLoadEnd",
    signature: "(Lorg/cef/browser/CefBrowser;Lorg/cef/browser/CefFrame;I)V",
};

pub const ON_LOAD_ERROR: ListenerMethod = ListenerMethod {
    name: "onLoadError",
    signature: "(Lorg/cef/browser/CefBrowser;Lorg/cef/browser/CefFrame;\
                Lorg/cef/handler/CefLoadHandler$ErrorCode;\
                Ljava/lang/String;Ljava/lang/String;)V",
};

/// All listener methods, in callback order.
pub const ALL: [ListenerMethod; 4] = [
    ON_LOADING_STATE_CHANGE,
    ON_LOAD_START,
    ON_LOAD_END,
    ON_LOAD_ERROR,
];

impl ListenerMethod {
    /// Number of parameters declared by the signature.
    pub fn arity(&self) -> usize {
        let params = self
            .signature
            .strip_prefix('(')
            .and_then(|s| s.split_once(')'))
            .map(|(params, _)| params)
            .unwrap_or("");

        let mut count = 0;
        let mut chars = params.chars();
        while let Some(c) = chars.next() {
            match c {
                // Array dimensions prefix the element type.
                '[' => continue,
                'L' => {
                    for c in chars.by_ref() {
                        if c == ';' {
                            break;
                        }
                    }
                    count += 1;
                }
                _ => count += 1,
            }
        }
        count
    }

    pub fn by_name(name: &str) -> Option<ListenerMethod> {
        ALL.into_iter().find(|m| m.name == name)
    }
}

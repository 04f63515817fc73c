//! The JavaScript runtime injected into every top-level page.
//!
//! The embedding surface must install a message port named
//! [`INTERFACE_NAME`] and evaluate [`PAGE_RUNTIME_JS`] on every page load.
//! The script shims `navigator.credentials.create` and
//! `navigator.credentials.get`: calls carrying a `publicKey` member are
//! redirected through the bridge, all others pass through unmodified to the
//! saved originals. Binary fields travel as unpadded base64url text in both
//! directions; the page side of the codec lives in this script.

/// Name of the message port the embedding surface must inject into pages.
pub const INTERFACE_NAME: &str = "__webauthn_interface__";

/// Page-side bridge runtime, evaluated on every top-level page load.
pub const PAGE_RUNTIME_JS: &str = r#"var __webauthn_interface__, __webauthn_hooks__;
(function (hooks) {
    var createResolve = null;
    var createReject = null;
    var getResolve = null;
    var getReject = null;

    function base64urlEncode(buffer) {
        var text = btoa(Array.from(new Uint8Array(buffer), function (b) {
            return String.fromCharCode(b);
        }).join(""));
        return text.replace(/\+/g, "-").replace(/\//g, "_").replace(/=+$/, "");
    }

    function base64urlDecode(text) {
        var rem = text.length % 4;
        var padded = text
            .replace(/-/g, "+")
            .replace(/_/g, "/")
            .padEnd(text.length + (rem === 0 ? 0 : 4 - rem), "=");
        return Uint8Array.from(atob(padded), function (c) {
            return c.charCodeAt(0);
        }).buffer;
    }

    // Decodes the binary fields of a ceremony response in place. Fields are
    // response-type-specific, so each is decoded only when present.
    function decodeResponseFields(credential) {
        credential.rawId = base64urlDecode(credential.rawId);
        credential.response.clientDataJSON = base64urlDecode(credential.response.clientDataJSON);
        if (credential.response.hasOwnProperty("attestationObject")) {
            credential.response.attestationObject = base64urlDecode(credential.response.attestationObject);
        }
        if (credential.response.hasOwnProperty("authenticatorData")) {
            credential.response.authenticatorData = base64urlDecode(credential.response.authenticatorData);
        }
        if (credential.response.hasOwnProperty("signature")) {
            credential.response.signature = base64urlDecode(credential.response.signature);
        }
        if (credential.response.hasOwnProperty("userHandle") && credential.response.userHandle !== null) {
            credential.response.userHandle = base64urlDecode(credential.response.userHandle);
        }
        if (credential.hasOwnProperty("clientExtensionResults")) {
            credential.getClientExtensionResults = function () {
                return credential.clientExtensionResults;
            };
        }
        if (credential.response.hasOwnProperty("transports")) {
            credential.response.getTransports = function () {
                return credential.response.transports;
            };
        }
        return credential;
    }

    function settle(reply, resolve, reject) {
        if (resolve === null || reject === null) {
            console.log("bridge reply with no pending request");
            return;
        }
        if (reply[0] !== "success") {
            reject(new DOMException(reply[1], "NotAllowedError"));
            return;
        }
        resolve(decodeResponseFields(reply[1]));
    }

    function onReplyCreate(reply) {
        var resolve = createResolve;
        var reject = createReject;
        createResolve = null;
        createReject = null;
        settle(reply, resolve, reject);
    }

    function onReplyGet(reply) {
        var resolve = getResolve;
        var reject = getReject;
        getResolve = null;
        getReject = null;
        settle(reply, resolve, reject);
    }

    __webauthn_interface__.addEventListener("message", function (event) {
        var reply = JSON.parse(event.data);
        var kind = reply[2];
        if (kind === "create") {
            onReplyCreate(reply);
        } else if (kind === "get") {
            onReplyGet(reply);
        } else {
            console.log("bridge reply with unknown kind: " + kind);
        }
    });

    hooks.create = function (options) {
        if (!("publicKey" in options)) {
            return hooks.originalCreateFunction(options);
        }
        var pending = new Promise(function (resolve, reject) {
            createResolve = resolve;
            createReject = reject;
        });
        var request = options.publicKey;
        if (request.hasOwnProperty("challenge")) {
            request.challenge = base64urlEncode(request.challenge);
        }
        if (request.hasOwnProperty("user") && request.user.hasOwnProperty("id")) {
            request.user.id = base64urlEncode(request.user.id);
        }
        __webauthn_interface__.postMessage(JSON.stringify({ type: "create", request: request }));
        return pending;
    };

    hooks.get = function (options) {
        if (!("publicKey" in options)) {
            return hooks.originalGetFunction(options);
        }
        var pending = new Promise(function (resolve, reject) {
            getResolve = resolve;
            getReject = reject;
        });
        var request = options.publicKey;
        if (request.hasOwnProperty("challenge")) {
            request.challenge = base64urlEncode(request.challenge);
        }
        if (request.hasOwnProperty("allowCredentials")) {
            Object.values(request.allowCredentials).forEach(function (descriptor) {
                if (descriptor.hasOwnProperty("id")) {
                    descriptor.id = base64urlEncode(descriptor.id);
                }
            });
        }
        __webauthn_interface__.postMessage(JSON.stringify({ type: "get", request: request }));
        return pending;
    };
})(__webauthn_hooks__ || (__webauthn_hooks__ = {}));
__webauthn_hooks__.originalGetFunction = navigator.credentials.get;
__webauthn_hooks__.originalCreateFunction = navigator.credentials.create;
navigator.credentials.get = __webauthn_hooks__.get;
navigator.credentials.create = __webauthn_hooks__.create;
window.PublicKeyCredential = function () {};
window.PublicKeyCredential.isUserVerifyingPlatformAuthenticatorAvailable = function () {
    return Promise.resolve(false);
};
"#;

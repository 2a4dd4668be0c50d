//! Embedded handler template and companion module source.

/// The fixed placeholder set every handler template must reference.
///
/// An unknown token or a missing token in a template is a build-time defect,
/// rejected before rendering.
pub const PLACEHOLDERS: [&str; 9] = [
    "plugin_import_code",
    "route_spec_file",
    "dynamic_prod_options",
    "plugins_code",
    "server_directory",
    "shared_directory",
    "api_directory",
    "lambda_directory",
    "meta_name",
];

/// Default handler template for the target platform's function contract.
///
/// The generated module exports `onRequest`, invoked by the platform once
/// per incoming request with an event context. Placeholders are substituted
/// wherever they appear; directory paths are emitted as path-join
/// expressions because the module executes on an unknown target filesystem.
pub const ENTRY_TEMPLATE: &str = r#"const fs = require('node:fs');
const path = require('node:path');
const { createEdgeFunction } = require('@modern-js/prod-server/edge');
const { forwardRequest } = require('./forward-request');

{{plugin_import_code}}

const dynamicProdOptions = {{dynamic_prod_options}};

let requestHandler = null;

async function createHandler() {
  const routeSpecPath = path.join(__dirname, {{route_spec_file}});
  const { routes } = JSON.parse(fs.readFileSync(routeSpecPath, 'utf8'));

  const prodServerOptions = {
    pwd: __dirname,
    routes,
    config: dynamicProdOptions.config,
    serverConfigPath: {{server_directory}},
    plugins: {{plugins_code}},
    appContext: {
      sharedDirectory: {{shared_directory}},
      apiDirectory: {{api_directory}},
      lambdaDirectory: {{lambda_directory}},
      metaName: '{{meta_name}}',
    },
    disableCustomHook: true,
  };

  requestHandler = await createEdgeFunction(prodServerOptions);
  return requestHandler;
}

const handlerCreation = createHandler();

async function onRequest(context) {
  const handler = requestHandler || (await handlerCreation);
  return forwardRequest(handler, context);
}

module.exports = { onRequest };
"#;

/// Companion module written next to the entry: normalizes the platform's
/// event context and forwards the request to the created handler.
pub const COMPANION_SOURCE: &str = r#"// Thin forwarding layer between the platform's function-invocation
// contract and the runtime server's request handler.

function normalizeEvent(context) {
  return {
    env: context.env,
    clientIp: context.clientIp,
    server: context.server,
    geo: context.geo,
  };
}

function forwardRequest(handler, context) {
  return handler(context.request, normalizeEvent(context));
}

module.exports = { forwardRequest, normalizeEvent };
"#;

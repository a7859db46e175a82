//! Compose descriptor for the Traefik reverse-proxy stack.

use std::fmt::Write as _;

use crate::domain::config::ProxyConfig;

/// Render `docker-compose.yml` for the reverse proxy.
///
/// Entry points `web` (80, redirected to HTTPS) and `websecure` (443); the
/// docker provider only routes containers on `proxy.network`; certificates
/// come from the ACME TLS challenge and are stored in `./acme.json`. The
/// dashboard router is emitted only when `dashboard_host` is set, guarded by
/// basic auth when `dashboard_users` is set.
#[must_use]
pub fn render_proxy_compose(proxy: &ProxyConfig) -> String {
    let network = &proxy.network;
    let mut out = format!(
        r#"services:
  traefik:
    image: {image}
    container_name: traefik
    restart: unless-stopped
    security_opt:
      - no-new-privileges:true
    networks:
      - {network}
    ports:
      - "80:80"
      - "443:443"
    volumes:
      - "/var/run/docker.sock:/var/run/docker.sock:ro"
      - "./acme.json:/acme.json"
    command:
      - "--global.checkNewVersion=true"
      - "--global.sendAnonymousUsage=false"
      - "--entryPoints.web.address=:80"
      - "--entryPoints.websecure.address=:443"
      - "--entryPoints.web.http.redirections.entryPoint.to=websecure"
      - "--entryPoints.web.http.redirections.entryPoint.scheme=https"
      - "--entryPoints.web.http.redirections.entryPoint.permanent=true"
      - "--providers.docker=true"
      - "--providers.docker.exposedByDefault=false"
      - "--providers.docker.network={network}"
      - "--certificatesresolvers.myresolver.acme.tlschallenge=true"
      - "--certificatesresolvers.myresolver.acme.email={email}"
      - "--certificatesresolvers.myresolver.acme.storage=/acme.json"
"#,
        image = proxy.image,
        email = proxy.acme_email,
    );

    if let Some(host) = &proxy.dashboard_host {
        out.push_str(
            "      - \"--api=true\"\n      - \"--api.dashboard=true\"\n    labels:\n      - \"traefik.enable=true\"\n",
        );
        let router = "traefik.http.routers.traefik_dashboard";
        let _ = writeln!(out, "      - \"{router}.rule=Host(`{host}`)\"");
        let _ = writeln!(out, "      - \"{router}.entrypoints=websecure\"");
        let _ = writeln!(out, "      - \"{router}.service=api@internal\"");
        let _ = writeln!(out, "      - \"{router}.tls.certresolver=myresolver\"");
        if let Some(users) = &proxy.dashboard_users {
            let _ = writeln!(out, "      - \"{router}.middlewares=auth\"");
            // Compose treats `$` as interpolation; `$$` is a literal dollar.
            let users = users.replace('$', "$$");
            let _ = writeln!(
                out,
                "      - \"traefik.http.middlewares.auth.basicauth.users={users}\""
            );
        }
    }

    let _ = write!(
        out,
        "\nnetworks:\n  {network}:\n    external: true\n"
    );
    out
}

use berth_schema::EnvironmentType;

/// Built-in configuration for one technology stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Blueprint {
    pub env_type: EnvironmentType,
    pub compose: &'static str,
}

pub(crate) const BUILTIN_BLUEPRINTS: &[Blueprint] = &[
    Blueprint {
        env_type: EnvironmentType::Magento2,
        compose: r#"services:
  php:
    image: ajardin/magento2-php:${DOCKER_PHP_IMAGE}
    environment:
      - SSH_AUTH_SOCK=/run/host-services/ssh-auth.sock
    volumes:
      - /run/host-services/ssh-auth.sock:/run/host-services/ssh-auth.sock
      - synchro:/var/www/html:nocopy
    tty: true

  nginx:
    image: ajardin/magento2-nginx:latest
    depends_on:
      - php
    ports:
      - "80:80"
      - "443:443"
    volumes:
      - ${PROJECT_LOCATION}/var/docker/nginx:/etc/nginx/conf.d:ro
      - synchro:/var/www/html:nocopy

  database:
    image: mariadb:10.4
    environment:
      - MYSQL_ROOT_PASSWORD=magento
      - MYSQL_DATABASE=magento
    ports:
      - "3306:3306"
    volumes:
      - database:/var/lib/mysql

  elasticsearch:
    image: elasticsearch:7.9.3
    environment:
      - discovery.type=single-node
      - ES_JAVA_OPTS=-Xms512m -Xmx512m

  redis:
    image: redis:6-alpine

  synchro:
    image: ajardin/synchro:latest
    container_name: ${COMPOSE_PROJECT_NAME}_synchro
    volumes:
      - synchro:/var/www/html:nocopy

volumes:
  database: {}
  synchro: {}
"#,
    },
    Blueprint {
        env_type: EnvironmentType::Sylius,
        compose: r#"services:
  php:
    image: ajardin/sylius-php:${DOCKER_PHP_IMAGE}
    environment:
      - SSH_AUTH_SOCK=/run/host-services/ssh-auth.sock
    volumes:
      - /run/host-services/ssh-auth.sock:/run/host-services/ssh-auth.sock
      - synchro:/var/www/html:nocopy
    tty: true

  nginx:
    image: ajardin/sylius-nginx:latest
    depends_on:
      - php
    ports:
      - "80:80"
      - "443:443"
    volumes:
      - ${PROJECT_LOCATION}/var/docker/nginx:/etc/nginx/conf.d:ro
      - synchro:/var/www/html:nocopy

  database:
    image: mariadb:10.4
    environment:
      - MYSQL_ROOT_PASSWORD=sylius
      - MYSQL_DATABASE=sylius
    ports:
      - "3306:3306"
    volumes:
      - database:/var/lib/mysql

  synchro:
    image: ajardin/synchro:latest
    container_name: ${COMPOSE_PROJECT_NAME}_synchro
    volumes:
      - synchro:/var/www/html:nocopy

volumes:
  database: {}
  synchro: {}
"#,
    },
    Blueprint {
        env_type: EnvironmentType::Symfony,
        compose: r#"services:
  php:
    image: ajardin/symfony-php:${DOCKER_PHP_IMAGE}
    environment:
      - SSH_AUTH_SOCK=/run/host-services/ssh-auth.sock
    volumes:
      - /run/host-services/ssh-auth.sock:/run/host-services/ssh-auth.sock
      - synchro:/var/www/html:nocopy
    tty: true

  nginx:
    image: ajardin/symfony-nginx:latest
    depends_on:
      - php
    ports:
      - "80:80"
      - "443:443"
    volumes:
      - ${PROJECT_LOCATION}/var/docker/nginx:/etc/nginx/conf.d:ro
      - synchro:/var/www/html:nocopy

  database:
    image: postgres:13-alpine
    environment:
      - POSTGRES_USER=symfony
      - POSTGRES_PASSWORD=symfony
      - POSTGRES_DB=symfony
    ports:
      - "5432:5432"
    volumes:
      - database:/var/lib/postgresql/data

  synchro:
    image: ajardin/synchro:latest
    container_name: ${COMPOSE_PROJECT_NAME}_synchro
    volumes:
      - synchro:/var/www/html:nocopy

volumes:
  database: {}
  synchro: {}
"#,
    },
];

const NGINX_HTTP: &str = r"server {
    listen 80;
    server_name {{server_name}};
    root {{document_root}};
    index index.php;

    location / {
        try_files $uri /index.php$is_args$args;
    }

    location ~ \.php$ {
        fastcgi_pass php:9000;
        fastcgi_param SCRIPT_FILENAME $realpath_root$fastcgi_script_name;
        include fastcgi_params;
    }
}
";

const NGINX_TLS: &str = r"
server {
    listen 443 ssl http2;
    server_name {{server_name}};
    root {{document_root}};
    index index.php;

    ssl_certificate /etc/nginx/conf.d/certs/custom.pem;
    ssl_certificate_key /etc/nginx/conf.d/certs/custom.key;

    location / {
        try_files $uri /index.php$is_args$args;
    }

    location ~ \.php$ {
        fastcgi_pass php:9000;
        fastcgi_param SCRIPT_FILENAME $realpath_root$fastcgi_script_name;
        include fastcgi_params;
    }
}
";

pub(crate) fn blueprint_for(env_type: EnvironmentType) -> &'static Blueprint {
    BUILTIN_BLUEPRINTS
        .iter()
        .find(|b| b.env_type == env_type)
        .unwrap_or(&BUILTIN_BLUEPRINTS[0])
}

/// Reverse-proxy configuration; the TLS server block is only emitted when a
/// certificate is generated for `domains`.
pub(crate) fn render_nginx(env_type: EnvironmentType, domains: &[&str]) -> String {
    let server_name = if domains.is_empty() {
        "localhost".to_owned()
    } else {
        domains.join(" ")
    };

    let mut conf = NGINX_HTTP.to_owned();
    if !domains.is_empty() {
        conf.push_str(NGINX_TLS);
    }
    conf.replace("{{server_name}}", &server_name)
        .replace("{{document_root}}", env_type.document_root())
}

pub(crate) fn render_dotenv(php_version: &str) -> String {
    format!("DOCKER_PHP_IMAGE={php_version}\n")
}

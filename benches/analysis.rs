#[macro_use]
extern crate bencher;

use bencher::Bencher;
use graphql_cache_patch::{analyze, ast::*, config::Config, documents::DocumentSet, schema::Schema};

fn graphql_parse_documents(bench: &mut Bencher) {
    bench.iter(|| {
        let ctx = ASTContext::new();
        Document::parse(&ctx, DOCUMENTS).ok();
    });
}

fn graphql_parse_schema(bench: &mut Bencher) {
    bench.iter(|| {
        let ctx = ASTContext::new();
        Schema::parse(&ctx, SCHEMA).ok();
    });
}

fn graphql_analyze(bench: &mut Bencher) {
    let config = Config::default();
    bench.iter(|| {
        let ctx = ASTContext::new();
        let schema = Schema::parse(&ctx, SCHEMA).unwrap();
        let mut documents = DocumentSet::new();
        documents.add_source(&ctx, "app.graphql", DOCUMENTS).unwrap();
        analyze(&ctx, schema, &documents, &config).unwrap()
    });
}

benchmark_group!(
    analysis,
    graphql_parse_documents,
    graphql_parse_schema,
    graphql_analyze
);

benchmark_main!(analysis);

static SCHEMA: &str = r#"
schema { query: Query, mutation: Mutation }

interface Node { id: ID! }

type Query {
  viewer: User
  user(id: ID!): User
  users(first: Int): [User!]!
  node(id: ID!): Node
}

type Mutation {
  updateUser(id: ID!, name: String): User
  addFriend(userID: ID!, friendID: ID!): User
  removeFriend(userID: ID!, friendID: ID!): User
  createPost(title: String!): Post
  deletePost(id: ID!): DeletePostPayload
}

type DeletePostPayload { postID: ID! }

type User implements Node {
  id: ID!
  name: String
  email: String
  friends(filter: String, online: Boolean): [User!]!
  posts(first: Int, status: PostStatus): [Post!]!
}

enum PostStatus { DRAFT, PUBLISHED }

type Post implements Node {
  id: ID!
  title: String!
  author: User
}
"#;

static DOCUMENTS: &str = r#"
query Viewer {
  viewer {
    id
    name
    friends @connection(name: "Viewer_Friends") {
      id
      ...UserCard
    }
    posts(status: PUBLISHED) @connection(name: "Viewer_Posts") {
      id
      title
    }
  }
}

query Users($first: Int) {
  users(first: $first) {
    id
    ...UserCard
    friends(online: true) @connection(name: "User_Friends") {
      id
      name
    }
  }
}

query Node($id: ID!) {
  node(id: $id) {
    id
    ... on User { name email }
    ... on Post { title }
  }
}

fragment UserCard on User {
  id
  name
  email
}

mutation UpdateUser($id: ID!, $name: String) {
  updateUser(id: $id, name: $name) {
    id
    name
  }
}

mutation AddFriend($userID: ID!, $friendID: ID!) {
  addFriend(userID: $userID, friendID: $friendID) {
    ...Viewer_Friends_insert @prepend
    ...User_Friends_insert @append(parentID: $userID, when: { online: true })
  }
}

mutation RemoveFriend($userID: ID!, $friendID: ID!) {
  removeFriend(userID: $userID, friendID: $friendID) {
    ...Viewer_Friends_remove
  }
}

mutation CreatePost($title: String!) {
  createPost(title: $title) {
    ...Viewer_Posts_insert @when(status: PUBLISHED)
  }
}

mutation DeletePost($id: ID!) {
  deletePost(id: $id) {
    postID @Post_delete
  }
}
"#;

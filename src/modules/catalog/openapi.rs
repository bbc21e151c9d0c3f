//! OpenAPI fragment for the catalog routes. Paths are relative to the
//! module mount point.

use serde_json::{json, Value};

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn error_response(description: &str) -> Value {
    json_response(description, schema_ref("ErrorResponse"))
}

fn page_of(item: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "items": { "type": "array", "items": schema_ref(item) },
            "page": { "type": "integer" },
            "page_size": { "type": "integer" },
            "total_items": { "type": "integer" },
            "total_pages": { "type": "integer" },
            "has_previous": { "type": "boolean" },
            "has_next": { "type": "boolean" }
        }
    })
}

fn id_param(format: &str) -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": if format == "uuid" { "string" } else { "integer" }, "format": format }
    })
}

fn page_param() -> Value {
    json!({
        "name": "page",
        "in": "query",
        "required": false,
        "schema": {
            "oneOf": [
                { "type": "integer", "minimum": 1 },
                { "type": "string", "enum": ["last"] }
            ]
        }
    })
}

fn body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema_ref(schema) } }
    })
}

pub(super) fn document() -> Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "Catalog counts and the caller's visit count",
                    "tags": ["Catalog"],
                    "responses": { "200": json_response("Dashboard", schema_ref("Dashboard")) }
                }
            },
            "/genres": {
                "get": {
                    "summary": "List genres",
                    "tags": ["Catalog"],
                    "responses": {
                        "200": json_response("Genres", json!({ "type": "array", "items": schema_ref("Genre") }))
                    }
                },
                "post": {
                    "summary": "Create a genre",
                    "tags": ["Catalog"],
                    "requestBody": body("GenreInput"),
                    "responses": {
                        "201": json_response("Created", schema_ref("Genre")),
                        "401": error_response("Not logged in"),
                        "403": error_response("Staff only"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/books": {
                "get": {
                    "summary": "List books, paginated",
                    "tags": ["Catalog"],
                    "parameters": [page_param()],
                    "responses": {
                        "200": json_response("A page of books", page_of("Book")),
                        "404": error_response("Page out of range")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Catalog"],
                    "requestBody": body("BookInput"),
                    "responses": {
                        "201": json_response("Created", schema_ref("Book")),
                        "401": error_response("Not logged in"),
                        "403": error_response("Staff only"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Book detail with its copies",
                    "tags": ["Catalog"],
                    "parameters": [id_param("int64")],
                    "responses": {
                        "200": json_response("Book detail", schema_ref("BookDetail")),
                        "404": error_response("Unknown book")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Catalog"],
                    "parameters": [id_param("int64")],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "403": error_response("Staff only"),
                        "404": error_response("Unknown book")
                    }
                }
            },
            "/authors": {
                "get": {
                    "summary": "List authors",
                    "tags": ["Catalog"],
                    "responses": {
                        "200": json_response("Authors", json!({ "type": "array", "items": schema_ref("Author") }))
                    }
                },
                "post": {
                    "summary": "Create an author",
                    "tags": ["Catalog"],
                    "requestBody": body("AuthorInput"),
                    "responses": {
                        "201": json_response("Created", schema_ref("Author")),
                        "403": error_response("Staff only"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/authors/{id}": {
                "get": {
                    "summary": "Author detail with their books",
                    "tags": ["Catalog"],
                    "parameters": [id_param("int64")],
                    "responses": {
                        "200": json_response("Author detail", schema_ref("AuthorDetail")),
                        "404": error_response("Unknown author")
                    }
                },
                "put": {
                    "summary": "Update an author",
                    "tags": ["Catalog"],
                    "parameters": [id_param("int64")],
                    "requestBody": body("AuthorInput"),
                    "responses": {
                        "200": json_response("Updated", schema_ref("Author")),
                        "403": error_response("Staff only"),
                        "404": error_response("Unknown author"),
                        "422": error_response("Validation error")
                    }
                },
                "delete": {
                    "summary": "Delete an author; their books are kept without an author",
                    "tags": ["Catalog"],
                    "parameters": [id_param("int64")],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "403": error_response("Staff only"),
                        "404": error_response("Unknown author")
                    }
                }
            },
            "/bookinstances": {
                "post": {
                    "summary": "Create a book copy",
                    "tags": ["Loans"],
                    "requestBody": body("BookInstanceInput"),
                    "responses": {
                        "201": json_response("Created", schema_ref("BookInstance")),
                        "403": error_response("Staff only"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/bookinstances/{id}": {
                "get": {
                    "summary": "Book copy detail",
                    "tags": ["Loans"],
                    "parameters": [id_param("uuid")],
                    "responses": {
                        "200": json_response("Book copy", schema_ref("BookInstance")),
                        "404": error_response("Unknown copy")
                    }
                },
                "put": {
                    "summary": "Update a book copy",
                    "tags": ["Loans"],
                    "parameters": [id_param("uuid")],
                    "requestBody": body("BookInstanceInput"),
                    "responses": {
                        "200": json_response("Updated", schema_ref("BookInstance")),
                        "403": error_response("Staff only"),
                        "404": error_response("Unknown copy"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/bookinstances/{id}/renew": {
                "get": {
                    "summary": "Renewal form proposing a date three weeks out",
                    "tags": ["Loans"],
                    "parameters": [id_param("uuid")],
                    "responses": {
                        "200": json_response("Renewal form", schema_ref("RenewalPage")),
                        "401": error_response("Not logged in"),
                        "403": error_response("Missing catalog.can_mark_returned"),
                        "404": error_response("Unknown copy")
                    }
                },
                "post": {
                    "summary": "Renew a loan; the date must fall within four weeks of today",
                    "tags": ["Loans"],
                    "parameters": [id_param("uuid")],
                    "requestBody": body("RenewBookForm"),
                    "responses": {
                        "200": json_response("Renewed copy", schema_ref("BookInstance")),
                        "401": error_response("Not logged in"),
                        "403": error_response("Missing catalog.can_mark_returned"),
                        "404": error_response("Unknown copy"),
                        "422": error_response("Invalid renewal date")
                    }
                }
            },
            "/mybooks": {
                "get": {
                    "summary": "Copies on loan to the caller",
                    "tags": ["Loans"],
                    "parameters": [page_param()],
                    "responses": {
                        "200": json_response("A page of copies", page_of("BookInstance")),
                        "401": error_response("Not logged in")
                    }
                }
            },
            "/borrowed": {
                "get": {
                    "summary": "Every copy on loan",
                    "tags": ["Loans"],
                    "parameters": [page_param()],
                    "responses": {
                        "200": json_response("A page of copies", page_of("BookInstance")),
                        "401": error_response("Not logged in"),
                        "403": error_response("Missing catalog.can_mark_returned")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Genre": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string", "maxLength": 200 }
                    },
                    "required": ["id", "name"]
                },
                "GenreInput": {
                    "type": "object",
                    "properties": { "name": { "type": "string", "maxLength": 200 } },
                    "required": ["name"]
                },
                "Author": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "first_name": { "type": "string" },
                        "last_name": { "type": "string" },
                        "date_of_birth": { "type": ["string", "null"], "format": "date" },
                        "date_of_death": { "type": ["string", "null"], "format": "date" },
                        "display_name": { "type": "string" }
                    },
                    "required": ["id", "first_name", "last_name", "display_name"]
                },
                "AuthorInput": {
                    "type": "object",
                    "properties": {
                        "first_name": { "type": "string", "maxLength": 100 },
                        "last_name": { "type": "string", "maxLength": 100 },
                        "date_of_birth": { "type": ["string", "null"], "format": "date" },
                        "date_of_death": { "type": ["string", "null"], "format": "date" }
                    },
                    "required": ["first_name", "last_name"]
                },
                "AuthorDetail": {
                    "type": "object",
                    "properties": {
                        "author": schema_ref("Author"),
                        "books": { "type": "array", "items": schema_ref("Book") }
                    }
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "title": { "type": "string" },
                        "author": {
                            "type": ["object", "null"],
                            "properties": {
                                "id": { "type": "integer" },
                                "name": { "type": "string" }
                            }
                        },
                        "summary": { "type": "string" },
                        "isbn": { "type": "string" },
                        "genres": { "type": "array", "items": schema_ref("Genre") },
                        "display_genre": { "type": "string" }
                    },
                    "required": ["id", "title", "summary", "isbn", "genres"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "maxLength": 200 },
                        "author_id": { "type": ["integer", "null"] },
                        "summary": { "type": "string", "maxLength": 1000 },
                        "isbn": { "type": "string", "maxLength": 13 },
                        "genre_ids": { "type": "array", "items": { "type": "integer" } }
                    },
                    "required": ["title", "summary", "isbn"]
                },
                "BookDetail": {
                    "type": "object",
                    "properties": {
                        "book": schema_ref("Book"),
                        "copies": { "type": "array", "items": schema_ref("BookInstance") }
                    }
                },
                "BookInstance": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "book": {
                            "type": ["object", "null"],
                            "properties": {
                                "id": { "type": "integer" },
                                "title": { "type": "string" }
                            }
                        },
                        "imprint": { "type": "string" },
                        "due_back": { "type": ["string", "null"], "format": "date" },
                        "borrower": {
                            "type": ["object", "null"],
                            "properties": {
                                "id": { "type": "integer" },
                                "username": { "type": "string" }
                            }
                        },
                        "status": { "type": "string", "enum": ["maintenance", "on_loan", "available", "reserved"] },
                        "status_label": { "type": "string" },
                        "is_overdue": { "type": "boolean" },
                        "display": { "type": "string" }
                    },
                    "required": ["id", "imprint", "status", "is_overdue"]
                },
                "BookInstanceInput": {
                    "type": "object",
                    "properties": {
                        "book_id": { "type": ["integer", "null"] },
                        "imprint": { "type": "string", "maxLength": 200 },
                        "due_back": { "type": ["string", "null"], "format": "date" },
                        "borrower_id": { "type": ["integer", "null"] },
                        "status": { "type": "string", "enum": ["maintenance", "on_loan", "available", "reserved"] }
                    },
                    "required": ["imprint"]
                },
                "RenewBookForm": {
                    "type": "object",
                    "properties": {
                        "renewal_date": { "type": "string", "format": "date" }
                    },
                    "required": ["renewal_date"]
                },
                "RenewalPage": {
                    "type": "object",
                    "properties": {
                        "book_instance": schema_ref("BookInstance"),
                        "form": schema_ref("RenewBookForm")
                    }
                },
                "Dashboard": {
                    "type": "object",
                    "properties": {
                        "num_books": { "type": "integer" },
                        "num_instances": { "type": "integer" },
                        "num_instances_available": { "type": "integer" },
                        "num_authors": { "type": "integer" },
                        "num_genres": { "type": "integer" },
                        "num_visits": { "type": "integer" }
                    }
                }
            }
        }
    })
}
